//! Post-processing of simulated stress fields

pub mod failure;
pub mod hydrostatic;
pub mod profiles;

pub use failure::{evaluate, FailureMode, FailureReason, Verdict};
pub use hydrostatic::{hydrostatic_stress, StressExtremes};
