//! Layer stack data model and the high-level simulation driver

pub mod layer;
pub mod simulation;
pub mod wave;

pub use layer::{Layer, LayerSpec};
pub use simulation::{simulate, Duration, InitialWave, SimulationParams, SimulationResult};
pub use wave::{Direction, Wave};
