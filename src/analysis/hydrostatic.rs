//! Hydrostatic stress transform
//!
//! The axial stress of a laterally confined layer is turned into an
//! isotropic-equivalent stress with the generalized Hooke's law:
//! `sigma_h = ((v / (1 - v)) * 2 + 1) * sigma / 3`.

use crate::domain::layer::Layer;
use ndarray::Array2;

/// Factor applied to the axial stress for a given Poisson ratio
pub fn hydrostatic_factor(poisson_ratio: f64) -> f64 {
    (poisson_ratio / (1.0 - poisson_ratio)) * 2.0 + 1.0
}

/// Hydrostatic stress over the full `[time, node]` field of a layer
pub fn hydrostatic_stress(layer: &Layer) -> Array2<f64> {
    let factor = hydrostatic_factor(layer.poisson_ratio());
    layer.mesh().mapv(|sigma| factor * sigma / 3.0)
}

/// Extreme hydrostatic stresses of a layer over all times and nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressExtremes {
    /// Largest tensile stress, floored at 0
    pub max_tension: f64,
    /// Largest compressive stress (most negative), capped at 0
    pub max_compression: f64,
}

impl StressExtremes {
    pub fn of(layer: &Layer) -> Self {
        hydrostatic_stress(layer).iter().fold(
            Self {
                max_tension: 0.0,
                max_compression: 0.0,
            },
            |acc, &s| Self {
                max_tension: acc.max_tension.max(s),
                max_compression: acc.max_compression.min(s),
            },
        )
    }
}
