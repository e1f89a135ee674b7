//! Reflection and transmission coefficients at layer boundaries

use crate::domain::layer::Layer;
use std::ops::Index;

/// Transmission coefficient for a wave going from impedance `z1` into `z2`
pub fn transmission(z1: f64, z2: f64) -> f64 {
    2.0 * z2 / (z1 + z2)
}

/// Reflection coefficient for a wave going from impedance `z1` toward `z2`
pub fn reflection(z1: f64, z2: f64) -> f64 {
    (z2 - z1) / (z2 + z1)
}

/// Coefficients of the boundary between layer `k` and layer `k + 1`
///
/// `forward` refers to a wave incident from layer `k`, `backward` to a wave
/// incident from layer `k + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceCoefficients {
    pub transmit_forward: f64,
    pub transmit_backward: f64,
    pub reflect_forward: f64,
    pub reflect_backward: f64,
}

impl InterfaceCoefficients {
    /// Coefficients for a boundary with impedance `z_left` on the layer-`k` side
    pub fn between(z_left: f64, z_right: f64) -> Self {
        Self {
            transmit_forward: transmission(z_left, z_right),
            transmit_backward: transmission(z_right, z_left),
            reflect_forward: reflection(z_left, z_right),
            reflect_backward: reflection(z_right, z_left),
        }
    }
}

/// Read-only table of every boundary in a stack
#[derive(Debug, Clone, Default)]
pub struct InterfaceTable {
    interfaces: Vec<InterfaceCoefficients>,
}

impl InterfaceTable {
    /// Build the table from impedances ordered like the stack
    pub fn from_impedances(impedances: &[f64]) -> Self {
        let interfaces = impedances
            .windows(2)
            .map(|pair| InterfaceCoefficients::between(pair[0], pair[1]))
            .collect();
        Self { interfaces }
    }

    /// Build the table for a layer stack
    pub fn from_layers(layers: &[Layer]) -> Self {
        let impedances: Vec<f64> = layers.iter().map(Layer::impedance).collect();
        Self::from_impedances(&impedances)
    }

    /// Coefficients of the boundary between layer `k` and `k + 1`
    pub fn boundary(&self, k: usize) -> Option<&InterfaceCoefficients> {
        self.interfaces.get(k)
    }

    /// Number of boundaries (`layers - 1`)
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceCoefficients> {
        self.interfaces.iter()
    }
}

impl Index<usize> for InterfaceTable {
    type Output = InterfaceCoefficients;

    fn index(&self, k: usize) -> &Self::Output {
        &self.interfaces[k]
    }
}
