//! Synchronized-grid stress-wave time stepper
//!
//! Every layer is discretized with `dx = c * dt`, so each wave crosses
//! exactly one node per time step regardless of the material. A step copies
//! the previous stress row forward, moves every wave by one node (reflecting
//! and transmitting at boundaries), delivers the waves spawned across
//! interfaces and finally merges coincident waves.

use crate::domain::layer::Layer;
use crate::domain::wave::{merge_coincident, Direction, Wave};
use crate::engine::interface::InterfaceTable;
use crate::error::{Result, WaveError};
use ndarray::{Array1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// How layers are swept within one time step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Execution {
    /// Layers are swept one after the other
    #[default]
    Serial,
    /// Layers are swept concurrently with rayon; steps stay sequential
    Parallel,
}

/// A wave spawned across an interface, waiting for delivery at end of step
#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    /// Index of the receiving layer
    pub target: usize,
    /// The new wave, positioned on the receiving layer's boundary node
    pub wave: Wave,
}

/// Counters gathered over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of time steps performed
    pub steps: usize,
    /// Largest total wave count seen after a merge pass
    pub peak_waves: usize,
    /// Waves removed by merging
    pub merged: usize,
}

/// Read-only data shared by every layer sweep
struct SweepContext<'a> {
    table: &'a InterfaceTable,
    node_counts: &'a [usize],
}

/// Advance every wave of layer `k` into time row `i`
///
/// Only rows `i - 1` and `i` of this layer are written. Waves headed for a
/// neighbour are returned instead of being inserted, so they do not move
/// again during the step that created them.
fn sweep_layer(k: usize, layer: &mut Layer, i: usize, ctx: &SweepContext<'_>) -> Vec<Transmission> {
    let last_layer = ctx.node_counts.len() - 1;
    let mesh = &mut layer.mesh;
    let mut outbox = Vec::new();

    {
        let (head, mut tail) = mesh.view_mut().split_at(Axis(0), i);
        tail.row_mut(0).assign(&head.row(i - 1));
    }

    for wave in layer.waves.iter_mut() {
        let last_node = wave.size - 1;
        match wave.direction {
            Direction::TowardStart => {
                if wave.pos == 0 {
                    if k == 0 {
                        // free face
                        wave.value = -wave.value;
                    } else {
                        wave.value *= ctx.table[k - 1].reflect_backward;
                        mesh[[i - 1, 0]] += wave.value;
                    }
                    mesh[[i, 0]] += wave.value;
                    mesh[[i, 1]] += wave.value;
                    wave.pos = 1;
                    wave.direction = Direction::TowardEnd;
                } else if wave.pos == last_node {
                    // Spawned on the far node during the previous step
                    mesh[[i, last_node]] += wave.value;
                    mesh[[i, last_node - 1]] += wave.value;
                    mesh[[i - 1, last_node]] += wave.value;
                    wave.pos -= 1;
                } else {
                    if wave.pos == 1 && k != 0 {
                        let target = k - 1;
                        let value = wave.value * ctx.table[target].transmit_backward;
                        outbox.push(Transmission {
                            target,
                            wave: Wave::at_end(ctx.node_counts[target], value),
                        });
                    }
                    mesh[[i, wave.pos - 1]] += wave.value;
                    wave.pos -= 1;
                }
            }
            Direction::TowardEnd => {
                if wave.pos == last_node {
                    if k == last_layer {
                        // free face
                        wave.value = -wave.value;
                    } else {
                        wave.value *= ctx.table[k].reflect_forward;
                        mesh[[i - 1, last_node]] += wave.value;
                    }
                    mesh[[i, last_node]] += wave.value;
                    mesh[[i, last_node - 1]] += wave.value;
                    wave.pos = last_node - 1;
                    wave.direction = Direction::TowardStart;
                } else if wave.pos == 0 {
                    // Spawned on the first node during the previous step
                    mesh[[i, 0]] += wave.value;
                    mesh[[i, 1]] += wave.value;
                    mesh[[i - 1, 0]] += wave.value;
                    wave.pos += 1;
                } else {
                    if wave.pos + 2 == wave.size && k != last_layer {
                        let target = k + 1;
                        let value = wave.value * ctx.table[k].transmit_forward;
                        outbox.push(Transmission {
                            target,
                            wave: Wave::at_start(ctx.node_counts[target], value),
                        });
                    }
                    mesh[[i, wave.pos + 1]] += wave.value;
                    wave.pos += 1;
                }
            }
        }
    }

    outbox
}

/// Time-stepping engine over a discretized layer stack
#[derive(Debug, Clone)]
pub struct WaveEngine {
    layers: Vec<Layer>,
    table: InterfaceTable,
    node_counts: Vec<usize>,
    times: Array1<f64>,
    time_step: f64,
    current: usize,
    execution: Execution,
    summary: RunSummary,
}

impl WaveEngine {
    /// Create an engine over layers discretized with `time_step`
    ///
    /// Time index 0 holds the initial condition: zero stress everywhere and
    /// the seeded waves pending for the first step.
    pub fn new(layers: Vec<Layer>, time_step: f64) -> Result<Self> {
        if layers.is_empty() {
            return Err(WaveError::EmptyStack);
        }
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(WaveError::invalid_timing(format!(
                "time step must be finite and positive, got {time_step}"
            )));
        }

        let expected = layers[0].mesh.nrows();
        for (k, layer) in layers.iter().enumerate() {
            if !layer.is_discretized() {
                return Err(WaveError::NotDiscretized { layer: k });
            }
            let rows = layer.mesh.nrows();
            if rows != expected || rows == 0 {
                return Err(WaveError::MeshMismatch {
                    layer: k,
                    rows,
                    expected,
                });
            }
            let spacing = layer.wave_speed() * time_step;
            if (layer.node_spacing() - spacing).abs() > 1e-9 * spacing {
                return Err(WaveError::invalid_timing(format!(
                    "layer {k} was discretized with a different time step"
                )));
            }
            if let Some(wave) = layer
                .waves
                .iter()
                .find(|w| w.size != layer.node_count() || !w.in_bounds())
            {
                return Err(WaveError::invalid_wave(format!(
                    "layer {k} holds a wave at node {} (size {}) outside its {} nodes",
                    wave.pos,
                    wave.size,
                    layer.node_count()
                )));
            }
        }

        let table = InterfaceTable::from_layers(&layers);
        let node_counts = layers.iter().map(Layer::node_count).collect();
        let times = Array1::from_shape_fn(expected, |i| i as f64 * time_step);
        let initial_waves = layers.iter().map(|l| l.waves.len()).sum();

        Ok(Self {
            layers,
            table,
            node_counts,
            times,
            time_step,
            current: 0,
            execution: Execution::default(),
            summary: RunSummary {
                peak_waves: initial_waves,
                ..RunSummary::default()
            },
        })
    }

    /// Choose how layers are swept within a step
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Perform the next time step
    ///
    /// Returns `false` without doing anything once the last time index has
    /// been reached.
    pub fn advance(&mut self) -> bool {
        let i = self.current + 1;
        if i >= self.times.len() {
            return false;
        }

        let ctx = SweepContext {
            table: &self.table,
            node_counts: &self.node_counts,
        };
        let outboxes: Vec<Vec<Transmission>> = match self.execution {
            Execution::Serial => self
                .layers
                .iter_mut()
                .enumerate()
                .map(|(k, layer)| sweep_layer(k, layer, i, &ctx))
                .collect(),
            Execution::Parallel => self
                .layers
                .par_iter_mut()
                .enumerate()
                .map(|(k, layer)| sweep_layer(k, layer, i, &ctx))
                .collect(),
        };

        // Deferred insertion, in layer order then queue order
        for transmission in outboxes.into_iter().flatten() {
            self.layers[transmission.target]
                .waves
                .push(transmission.wave);
        }

        let mut waves = 0;
        for layer in &mut self.layers {
            self.summary.merged += merge_coincident(&mut layer.waves);
            waves += layer.waves.len();
        }

        self.summary.peak_waves = self.summary.peak_waves.max(waves);
        self.summary.steps += 1;
        self.current = i;
        true
    }

    /// Run every remaining time step
    pub fn run(&mut self) -> RunSummary {
        self.log_start();
        let mut next_report = 10;
        while self.advance_logged(&mut next_report) {}
        self.finish()
    }

    /// Run every remaining time step, checking `cancel` once per step
    pub fn run_with_cancel(&mut self, cancel: &AtomicBool) -> Result<RunSummary> {
        self.log_start();
        let mut next_report = 10;
        loop {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(step = self.current + 1, "stress-wave run cancelled");
                return Err(WaveError::Cancelled {
                    step: self.current + 1,
                });
            }
            if !self.advance_logged(&mut next_report) {
                break;
            }
        }
        Ok(self.finish())
    }

    fn log_start(&self) {
        tracing::info!(
            layers = self.layers.len(),
            time_steps = self.times.len(),
            time_step = self.time_step,
            execution = ?self.execution,
            "starting stress-wave run"
        );
    }

    /// `advance` plus a debug line every 10% of the time vector
    fn advance_logged(&mut self, next_report: &mut usize) -> bool {
        if !self.advance() {
            return false;
        }
        let total = self.times.len();
        while *next_report <= 100 && self.current * 100 >= *next_report * total {
            tracing::debug!(
                percent = *next_report,
                step = self.current,
                waves = self.wave_count(),
                "stress-wave progress"
            );
            *next_report += 10;
        }
        true
    }

    fn finish(&self) -> RunSummary {
        tracing::info!(
            steps = self.summary.steps,
            peak_waves = self.summary.peak_waves,
            merged = self.summary.merged,
            "stress-wave run complete"
        );
        self.summary
    }

    /// Index of the last time row that has been filled
    pub fn current_step(&self) -> usize {
        self.current
    }

    /// Whether the terminal time index has been reached
    pub fn is_finished(&self) -> bool {
        self.current + 1 >= self.times.len()
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Time vector `t[i] = i * dt` in us
    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn table(&self) -> &InterfaceTable {
        &self.table
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Total number of active waves across the stack
    pub fn wave_count(&self) -> usize {
        self.layers.iter().map(|l| l.waves.len()).sum()
    }

    /// Hand the layers back for post-processing
    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }
}
