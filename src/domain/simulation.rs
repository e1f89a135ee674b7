//! High-level simulation interface for layered impact problems

use crate::analysis::failure::{evaluate, Verdict};
use crate::domain::layer::{Layer, LayerSpec, MAX_MESH_CELLS};
use crate::domain::wave::Wave;
use crate::engine::propagation::{Execution, RunSummary, WaveEngine};
use crate::error::{Result, WaveError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Length of the simulated window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Duration {
    /// Explicit duration in us
    Total(f64),
    /// Multiple of one round trip through every non-impactor layer
    Reverberations(f64),
}

impl Default for Duration {
    fn default() -> Self {
        Duration::Reverberations(1.0)
    }
}

impl Duration {
    /// Resolve to microseconds for the given stack
    ///
    /// One reverberation is `sum(2 h / c)` over layers `1..`, using thickness
    /// before grid snapping, rounded to two decimals.
    pub fn resolve(&self, layers: &[Layer]) -> Result<f64> {
        let duration = match *self {
            Duration::Total(total) => total,
            Duration::Reverberations(count) => {
                if layers.len() < 2 {
                    return Err(WaveError::invalid_timing(
                        "a reverberation duration needs at least one layer behind the impactor",
                    ));
                }
                let one_rev: f64 = layers[1..].iter().map(Layer::round_trip_time).sum();
                (one_rev * count * 100.0).round() / 100.0
            }
        };

        if duration.is_finite() && duration > 0.0 {
            Ok(duration)
        } else {
            Err(WaveError::invalid_timing(format!(
                "duration must be finite and positive, got {duration}"
            )))
        }
    }
}

/// Number of samples in `[0, duration)` with spacing `time_step`
pub fn time_steps(time_step: f64, duration: f64) -> Result<usize> {
    if !(time_step.is_finite() && time_step > 0.0) {
        return Err(WaveError::invalid_timing(format!(
            "time step must be finite and positive, got {time_step}"
        )));
    }
    if !(duration.is_finite() && duration > 0.0) {
        return Err(WaveError::invalid_timing(format!(
            "duration must be finite and positive, got {duration}"
        )));
    }
    let steps = (duration / time_step).ceil();
    if !(steps < MAX_MESH_CELLS as f64) {
        return Err(WaveError::invalid_timing(format!(
            "{duration} us at a time step of {time_step} us needs too many samples"
        )));
    }
    Ok((steps as usize).max(1))
}

/// Which boundary node of the layer an initial wave starts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    /// Node 0, travelling toward the end
    Start,
    /// Last node, travelling toward the start
    End,
}

/// Magnitude of an initial wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Load {
    /// Direct stress in Pa
    Stress(f64),
    /// Impact velocity in m/s, converted with the impedances of layers 0 and 1
    Velocity(f64),
}

/// An initial wave bound to a layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialWave {
    /// Layer index, 0 being the impactor
    pub layer: usize,
    pub boundary: Boundary,
    pub load: Load,
}

impl InitialWave {
    pub fn new(layer: usize, boundary: Boundary, load: Load) -> Self {
        Self {
            layer,
            boundary,
            load,
        }
    }
}

/// The pair of waves launched by an impactor striking layer 1
///
/// One wave runs back through the impactor from its far face, the other
/// enters the target from its near face. Both carry the contact stress.
pub fn impact(velocity: f64) -> [InitialWave; 2] {
    [
        InitialWave::new(0, Boundary::End, Load::Velocity(velocity)),
        InitialWave::new(1, Boundary::Start, Load::Velocity(velocity)),
    ]
}

/// Contact stress between two bodies of impedance `z0` and `z1`
pub fn contact_stress(velocity: f64, z0: f64, z1: f64) -> f64 {
    velocity / (1.0 / z0 + 1.0 / z1)
}

/// Seed initial waves into discretized layers
pub fn seed_initial_waves(layers: &mut [Layer], initial: &[InitialWave]) -> Result<()> {
    for (n, init) in initial.iter().enumerate() {
        if init.layer >= layers.len() {
            return Err(WaveError::invalid_wave(format!(
                "initial wave {n} targets layer {} but the stack has {} layers",
                init.layer,
                layers.len()
            )));
        }

        let value = match init.load {
            Load::Stress(stress) => stress,
            Load::Velocity(velocity) => {
                if layers.len() < 2 {
                    return Err(WaveError::invalid_wave(
                        "an impact velocity needs an impactor and a target layer",
                    ));
                }
                contact_stress(velocity, layers[0].impedance(), layers[1].impedance())
            }
        };

        let layer = &mut layers[init.layer];
        let size = layer.node_count();
        let wave = match init.boundary {
            Boundary::Start => Wave::at_start(size, value),
            Boundary::End => Wave::at_end(size, value),
        };
        layer.seed(wave)?;
    }
    Ok(())
}

/// Parameters for a stress-wave simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Shared time step in us
    pub time_step: f64,
    /// Simulated window
    pub duration: Duration,
    /// Layer sweep strategy
    pub execution: Execution,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            duration: Duration::default(),
            execution: Execution::Serial,
        }
    }
}

/// Result of a simulation
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Layers with their filled stress meshes
    pub layers: Vec<Layer>,
    /// Time vector in us
    pub times: Array1<f64>,
    /// Resolved duration in us
    pub duration: f64,
    /// Run counters
    pub summary: RunSummary,
}

impl SimulationResult {
    /// Check every relevant layer against its failure limits
    pub fn evaluate(&self) -> Result<Verdict> {
        evaluate(&self.layers)
    }
}

/// Build the layers of a stack from their descriptors
pub fn build_layers(specs: &[LayerSpec]) -> Result<Vec<Layer>> {
    if specs.is_empty() {
        return Err(WaveError::EmptyStack);
    }
    specs
        .iter()
        .enumerate()
        .map(|(k, spec)| {
            Layer::new(spec.clone()).map_err(|err| match err {
                WaveError::InvalidLayer(msg) => WaveError::invalid_layer(format!("layer {k}: {msg}")),
                other => other,
            })
        })
        .collect()
}

/// Prepare an engine: build, discretize and seed every layer
pub fn prepare(
    specs: &[LayerSpec],
    initial: &[InitialWave],
    params: &SimulationParams,
) -> Result<(WaveEngine, f64)> {
    let mut layers = build_layers(specs)?;
    let duration = params.duration.resolve(&layers)?;
    let steps = time_steps(params.time_step, duration)?;

    for layer in layers.iter_mut() {
        layer.discretize(params.time_step, steps)?;
    }
    seed_initial_waves(&mut layers, initial)?;

    let engine = WaveEngine::new(layers, params.time_step)?.with_execution(params.execution);
    Ok((engine, duration))
}

/// Main simulation function
///
/// # Arguments
/// * `specs` - Layers ordered from the impactor to the backing
/// * `initial` - Initial waves
/// * `params` - Time step, duration and execution mode
///
/// # Returns
/// * `SimulationResult` holding the per-layer stress meshes
pub fn simulate(
    specs: &[LayerSpec],
    initial: &[InitialWave],
    params: &SimulationParams,
) -> Result<SimulationResult> {
    let (mut engine, duration) = prepare(specs, initial, params)?;
    let summary = engine.run();
    let times = engine.times().clone();

    Ok(SimulationResult {
        layers: engine.into_layers(),
        times,
        duration,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn specs() -> Vec<LayerSpec> {
        vec![
            LayerSpec::new(2.0, 1e9, 1000.0, 1.0, 0.3),
            LayerSpec::new(1.0, 4e9, 1000.0, 1.0, 0.3),
            LayerSpec::new(3.0, 1e9, 1000.0, 1.0, 0.3),
        ]
    }

    #[test]
    fn test_reverberation_duration() {
        let layers = build_layers(&specs()).unwrap();
        // 2 * 1 / 2 + 2 * 3 / 1
        let one = Duration::Reverberations(1.0).resolve(&layers).unwrap();
        assert_abs_diff_eq!(one, 7.0, epsilon = 1e-12);
        let half = Duration::Reverberations(0.5).resolve(&layers).unwrap();
        assert_abs_diff_eq!(half, 3.5, epsilon = 1e-12);
        assert_eq!(Duration::Total(12.5).resolve(&layers).unwrap(), 12.5);

        assert!(Duration::Total(-1.0).resolve(&layers).is_err());
        assert!(Duration::Reverberations(1.0)
            .resolve(&layers[..1])
            .is_err());
    }

    #[test]
    fn test_time_steps_matches_half_open_range() {
        assert_eq!(time_steps(0.125, 25.0).unwrap(), 200);
        assert_eq!(time_steps(0.125, 25.1).unwrap(), 201);
        assert_eq!(time_steps(0.5, 0.1).unwrap(), 1);
        assert!(time_steps(0.0, 1.0).is_err());
        assert!(time_steps(0.1, f64::INFINITY).is_err());
        assert!(matches!(
            time_steps(1e-300, 1.0).unwrap_err(),
            WaveError::InvalidTiming(_)
        ));
    }

    #[test]
    fn test_contact_stress_from_velocity() {
        let layers = build_layers(&specs()).unwrap();
        // Z0 = 1e6, Z1 = 2e6
        let expected = -300.0 / (1.0 / 1e6 + 1.0 / 2e6);
        assert_abs_diff_eq!(
            contact_stress(-300.0, layers[0].impedance(), layers[1].impedance()),
            expected,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_impact_seeds_both_sides_of_contact() {
        let mut layers = build_layers(&specs()).unwrap();
        for layer in layers.iter_mut() {
            layer.discretize(0.125, 10).unwrap();
        }
        seed_initial_waves(&mut layers, &impact(-100.0)).unwrap();

        let impactor = &layers[0].waves()[0];
        assert_eq!(impactor.pos, layers[0].node_count() - 1);
        let target = &layers[1].waves()[0];
        assert_eq!(target.pos, 0);
        assert_eq!(impactor.value, target.value);
        assert!(impactor.value < 0.0);
    }

    #[test]
    fn test_seed_rejects_unknown_layer() {
        let mut layers = build_layers(&specs()).unwrap();
        for layer in layers.iter_mut() {
            layer.discretize(0.125, 10).unwrap();
        }
        let err = seed_initial_waves(
            &mut layers,
            &[InitialWave::new(3, Boundary::Start, Load::Stress(1.0))],
        )
        .unwrap_err();
        assert!(matches!(err, WaveError::InvalidWave(_)));
    }

    #[test]
    fn test_simulate_fills_time_vector() {
        let params = SimulationParams {
            time_step: 0.125,
            duration: Duration::Total(5.0),
            execution: Execution::Serial,
        };
        let result = simulate(&specs(), &impact(-50.0), &params).unwrap();

        assert_eq!(result.times.len(), 40);
        assert_abs_diff_eq!(result.times[39], 39.0 * 0.125, epsilon = 1e-12);
        assert_eq!(result.summary.steps, 39);
        for layer in &result.layers {
            assert_eq!(layer.mesh().nrows(), 40);
        }
        assert!(result.layers[1].mesh().iter().any(|&v| v < 0.0));
    }

    #[test]
    fn test_build_layers_reports_index() {
        let mut bad = specs();
        bad[2].density = 0.0;
        let err = build_layers(&bad).unwrap_err();
        assert!(err.to_string().contains("layer 2"));
        assert_eq!(build_layers(&[]).unwrap_err(), WaveError::EmptyStack);
    }
}
