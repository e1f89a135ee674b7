//! Error types for stress-wave simulations.

use thiserror::Error;

/// Result type for stress-wave operations.
pub type Result<T> = std::result::Result<T, WaveError>;

/// Errors that can occur while building, running or evaluating a simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaveError {
    /// A layer parameter is outside its physical range.
    #[error("Invalid layer parameter: {0}")]
    InvalidLayer(String),

    /// Time step or duration is unusable.
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// An initial wave references a missing layer or node.
    #[error("Invalid wave: {0}")]
    InvalidWave(String),

    /// The stack has no layers.
    #[error("The layer stack is empty")]
    EmptyStack,

    /// The time step is too coarse to resolve the layer thickness.
    #[error(
        "Time step too coarse: thickness {thickness} mm with node spacing {node_spacing} mm \
         resolves to {nodes} node(s)"
    )]
    CoarseTimeStep {
        thickness: f64,
        node_spacing: f64,
        nodes: usize,
    },

    /// A layer reached the engine without being discretized.
    #[error("Layer {layer} has not been discretized")]
    NotDiscretized { layer: usize },

    /// A layer mesh does not cover the shared time vector.
    #[error("Layer {layer} mesh has {rows} time rows, expected {expected}")]
    MeshMismatch {
        layer: usize,
        rows: usize,
        expected: usize,
    },

    /// A relevant layer has no failure limit, so the stack cannot be evaluated.
    #[error("Layer {layer} is relevant but has no failure limit; the composite cannot be evaluated")]
    MissingThreshold { layer: usize },

    /// The run was cancelled before the terminal time step.
    #[error("Simulation cancelled at time step {step}")]
    Cancelled { step: usize },
}

impl WaveError {
    /// Create an invalid layer error.
    pub fn invalid_layer(msg: impl Into<String>) -> Self {
        Self::InvalidLayer(msg.into())
    }

    /// Create an invalid timing error.
    pub fn invalid_timing(msg: impl Into<String>) -> Self {
        Self::InvalidTiming(msg.into())
    }

    /// Create an invalid wave error.
    pub fn invalid_wave(msg: impl Into<String>) -> Self {
        Self::InvalidWave(msg.into())
    }

    /// Whether the error was raised before stepping started.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidLayer(_)
                | Self::InvalidTiming(_)
                | Self::InvalidWave(_)
                | Self::EmptyStack
                | Self::CoarseTimeStep { .. }
                | Self::NotDiscretized { .. }
                | Self::MeshMismatch { .. }
        )
    }
}
