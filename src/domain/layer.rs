//! Material layers and their discretized stress field
//!
//! A layer is one slab of the stack, ordered from the impactor (index 0) to
//! the backing. Lengths are in millimetres, time in microseconds and stress
//! in pascals.

use crate::domain::wave::Wave;
use crate::error::{Result, WaveError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest number of `f64` cells a stress mesh may hold
pub const MAX_MESH_CELLS: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// External description of a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Thickness in mm
    pub thickness: f64,
    /// Young's modulus in Pa
    pub youngs_modulus: f64,
    /// Density in kg/m^3
    pub density: f64,
    /// Mass in kg, carried for reporting only
    #[serde(default)]
    pub mass: f64,
    /// Poisson ratio
    pub poisson_ratio: f64,
    /// Failure stress in tension (Pa)
    #[serde(default)]
    pub tension_limit: Option<f64>,
    /// Failure stress in compression (Pa)
    #[serde(default)]
    pub compression_limit: Option<f64>,
    /// Whether the layer takes part in failure evaluation (defaults to true)
    #[serde(default)]
    pub relevant: Option<bool>,
}

impl LayerSpec {
    /// Create a descriptor without failure limits
    pub fn new(
        thickness: f64,
        youngs_modulus: f64,
        density: f64,
        mass: f64,
        poisson_ratio: f64,
    ) -> Self {
        Self {
            thickness,
            youngs_modulus,
            density,
            mass,
            poisson_ratio,
            tension_limit: None,
            compression_limit: None,
            relevant: None,
        }
    }

    /// Set the tension limit
    pub fn with_tension_limit(mut self, limit: f64) -> Self {
        self.tension_limit = Some(limit);
        self
    }

    /// Set the compression limit
    pub fn with_compression_limit(mut self, limit: f64) -> Self {
        self.compression_limit = Some(limit);
        self
    }

    /// Mark the layer as relevant or not for failure evaluation
    pub fn with_relevance(mut self, relevant: bool) -> Self {
        self.relevant = Some(relevant);
        self
    }
}

/// One material slab with its stress field and active waves
#[derive(Debug, Clone)]
pub struct Layer {
    thickness: f64,
    youngs_modulus: f64,
    density: f64,
    mass: f64,
    poisson_ratio: f64,
    tension_limit: Option<f64>,
    compression_limit: Option<f64>,
    relevant: bool,
    wave_speed: f64,
    impedance: f64,
    node_spacing: f64,
    node_count: usize,
    pub(crate) mesh: Array2<f64>,
    pub(crate) waves: Vec<Wave>,
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(WaveError::invalid_layer(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

fn check_limit(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !(v.is_finite() && v >= 0.0) => Err(WaveError::invalid_layer(format!(
            "{name} must be finite and non-negative, got {v}"
        ))),
        _ => Ok(()),
    }
}

impl Layer {
    /// Build a layer from its descriptor, deriving wave speed and impedance
    pub fn new(spec: LayerSpec) -> Result<Self> {
        check_positive("thickness", spec.thickness)?;
        check_positive("Young's modulus", spec.youngs_modulus)?;
        check_positive("density", spec.density)?;
        // Outside (-1, 0.5] the hydrostatic factor changes sign or blows up
        if !(spec.poisson_ratio > -1.0 && spec.poisson_ratio <= 0.5) {
            return Err(WaveError::invalid_layer(format!(
                "Poisson ratio must lie in (-1, 0.5], got {}",
                spec.poisson_ratio
            )));
        }
        check_limit("tension limit", spec.tension_limit)?;
        check_limit("compression limit", spec.compression_limit)?;

        // One given limit stands in for the missing one
        let tension_limit = spec.tension_limit.or(spec.compression_limit);
        let compression_limit = spec.compression_limit.or(spec.tension_limit);

        // mm/us
        let wave_speed = (spec.youngs_modulus / spec.density).sqrt() / 1000.0;
        let impedance = spec.density * 1000.0 * wave_speed;

        Ok(Self {
            thickness: spec.thickness,
            youngs_modulus: spec.youngs_modulus,
            density: spec.density,
            mass: spec.mass,
            poisson_ratio: spec.poisson_ratio,
            tension_limit,
            compression_limit,
            relevant: spec.relevant.unwrap_or(true),
            wave_speed,
            impedance,
            node_spacing: 0.0,
            node_count: 0,
            mesh: Array2::zeros((0, 0)),
            waves: Vec::new(),
        })
    }

    /// Discretize the layer against the shared time step
    ///
    /// Node spacing is `c * dt`, so every wave crosses exactly one node per
    /// time step. The thickness snaps to `node_count * node_spacing` and the
    /// stress field is reset to zero with `time_steps` rows.
    pub fn discretize(&mut self, time_step: f64, time_steps: usize) -> Result<()> {
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(WaveError::invalid_timing(format!(
                "time step must be finite and positive, got {time_step}"
            )));
        }
        if time_steps == 0 {
            return Err(WaveError::invalid_timing(
                "the time vector must hold at least one sample",
            ));
        }

        let node_spacing = self.wave_speed * time_step;
        let intervals = (self.thickness / node_spacing).round_ties_even();
        if !(intervals.is_finite() && intervals < MAX_MESH_CELLS as f64) {
            return Err(WaveError::invalid_timing(format!(
                "time step {time_step} resolves {} mm into too many nodes",
                self.thickness
            )));
        }
        // +1 keeps one node more than an exact division
        let nodes = (intervals as usize).checked_add(1).ok_or_else(|| {
            WaveError::invalid_timing(format!("node count overflows for time step {time_step}"))
        })?;
        if nodes <= 1 {
            return Err(WaveError::CoarseTimeStep {
                thickness: self.thickness,
                node_spacing,
                nodes,
            });
        }
        if nodes == 2 {
            tracing::warn!(
                thickness = self.thickness,
                node_spacing,
                "layer resolves to two nodes; waves inside it cannot reach the transmission node"
            );
        }

        if time_steps
            .checked_mul(nodes)
            .map_or(true, |cells| cells > MAX_MESH_CELLS)
        {
            return Err(WaveError::invalid_timing(format!(
                "a {time_steps} x {nodes} stress mesh is too large"
            )));
        }

        self.node_spacing = node_spacing;
        self.node_count = nodes;
        self.thickness = nodes as f64 * node_spacing;
        self.mesh = Array2::zeros((time_steps, nodes));
        self.waves.clear();
        Ok(())
    }

    /// Install an initial wave
    pub fn seed(&mut self, wave: Wave) -> Result<()> {
        if !self.is_discretized() {
            return Err(WaveError::invalid_wave(
                "cannot seed a wave before the layer is discretized",
            ));
        }
        if wave.size != self.node_count || !wave.in_bounds() {
            return Err(WaveError::invalid_wave(format!(
                "wave at node {} (size {}) does not fit a layer of {} nodes",
                wave.pos, wave.size, self.node_count
            )));
        }
        if !wave.value.is_finite() {
            return Err(WaveError::invalid_wave(format!(
                "wave stress must be finite, got {}",
                wave.value
            )));
        }
        self.waves.push(wave);
        Ok(())
    }

    /// Thickness in mm (snapped to the grid once discretized)
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Young's modulus in Pa
    pub fn youngs_modulus(&self) -> f64 {
        self.youngs_modulus
    }

    /// Density in kg/m^3
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Mass in kg
    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn poisson_ratio(&self) -> f64 {
        self.poisson_ratio
    }

    pub fn tension_limit(&self) -> Option<f64> {
        self.tension_limit
    }

    pub fn compression_limit(&self) -> Option<f64> {
        self.compression_limit
    }

    pub fn is_relevant(&self) -> bool {
        self.relevant
    }

    /// Longitudinal wave speed in mm/us
    pub fn wave_speed(&self) -> f64 {
        self.wave_speed
    }

    /// Specific acoustic impedance `rho * c` in kg/(m^2 s)
    pub fn impedance(&self) -> f64 {
        self.impedance
    }

    /// Distance between nodes in mm (0 before discretization)
    pub fn node_spacing(&self) -> f64 {
        self.node_spacing
    }

    /// Number of nodes (0 before discretization)
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn is_discretized(&self) -> bool {
        self.node_count > 0
    }

    /// Stress field indexed by `[time_index, node]`
    pub fn mesh(&self) -> &Array2<f64> {
        &self.mesh
    }

    /// Waves currently travelling in the layer
    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    /// Position of every node across the thickness, in mm
    pub fn node_positions(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.node_count, |j| self.node_spacing * j as f64)
    }

    /// Round-trip time of a wave across the layer, in us
    pub fn round_trip_time(&self) -> f64 {
        2.0 * self.thickness / self.wave_speed
    }
}

fn fmt_limit(limit: Option<f64>) -> String {
    match limit {
        Some(v) => format!("{:.2} MPa", v / 1e6),
        None => "none".to_string(),
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{h = {:.2} mm, E = {:.2} GPa, rho = {:.2} kg/m^3, v = {}, c = {:.2} mm/us, \
             Sf tension = {}, Sf compression = {}}}",
            self.thickness,
            self.youngs_modulus / 1e9,
            self.density,
            self.poisson_ratio,
            self.wave_speed,
            fmt_limit(self.tension_limit),
            fmt_limit(self.compression_limit),
        )
    }
}
