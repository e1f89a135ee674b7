//! Engine module containing interface physics and the time stepper

pub mod interface;
pub mod propagation;

pub use interface::{InterfaceCoefficients, InterfaceTable};
pub use propagation::{Execution, RunSummary, WaveEngine};
