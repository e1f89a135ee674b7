//! StressWave - one-dimensional elastic stress-wave propagation through bonded layers
//!
//! A projectile striking a stack of material layers launches stress waves
//! that bounce between the layer faces. This library tracks those waves on
//! wave-speed-synchronized grids, records the stress field of every layer
//! over time and checks the result against the layers' failure limits.

pub mod analysis;
pub mod domain;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use analysis::failure::{evaluate, Verdict};
pub use domain::layer::{Layer, LayerSpec};
pub use domain::simulation::{simulate, SimulationParams, SimulationResult};
pub use error::{Result, WaveError};

pub mod prelude {
    //! Common imports for using the StressWave library
    pub use crate::analysis::failure::{evaluate, FailureMode, FailureReason, Verdict};
    pub use crate::analysis::hydrostatic::{hydrostatic_stress, StressExtremes};
    pub use crate::domain::layer::{Layer, LayerSpec};
    pub use crate::domain::simulation::{
        impact, simulate, Boundary, Duration, InitialWave, Load, SimulationParams,
        SimulationResult,
    };
    pub use crate::domain::wave::{Direction, Wave};
    pub use crate::engine::propagation::{Execution, WaveEngine};
    pub use crate::error::{Result, WaveError};
}
