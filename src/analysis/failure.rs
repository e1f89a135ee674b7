//! Pass/fail evaluation of a simulated stack

use crate::analysis::hydrostatic::StressExtremes;
use crate::domain::layer::Layer;
use crate::error::{Result, WaveError};
use std::fmt;

/// Which limit a layer exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Tension,
    Compression,
    Both,
}

/// Why a layer failed
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReason {
    /// Layer index in the stack
    pub layer: usize,
    pub mode: FailureMode,
    /// Hydrostatic extremes seen by the layer
    pub extremes: StressExtremes,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            FailureMode::Both => write!(
                f,
                "Both tension and compression stresses in layer #{} are above failure stress",
                self.layer
            ),
            FailureMode::Compression => write!(
                f,
                "Compression stress in layer #{} is above failure stress",
                self.layer
            ),
            FailureMode::Tension => write!(
                f,
                "Tension stress in layer #{} is above failure stress",
                self.layer
            ),
        }
    }
}

/// Structural verdict for the composite
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Every relevant layer stayed within its limits
    Pass,
    /// At least one relevant layer exceeded a limit
    Fail(Vec<FailureReason>),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// Failure reasons, empty on pass
    pub fn reasons(&self) -> &[FailureReason] {
        match self {
            Verdict::Pass => &[],
            Verdict::Fail(reasons) => reasons,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(
                f,
                "The composite CAN be considered as it satisfies stress conditions on relevant layers."
            ),
            Verdict::Fail(reasons) => {
                write!(f, "The composite MUST NOT be considered. The following occurred:")?;
                for reason in reasons {
                    write!(f, "\n{reason}")?;
                }
                Ok(())
            }
        }
    }
}

/// Check one layer against its limits
///
/// Returns `Ok(None)` when the layer holds. Exceeding a limit is strict.
pub fn check_layer(index: usize, layer: &Layer) -> Result<Option<FailureReason>> {
    let (Some(tension_limit), Some(compression_limit)) =
        (layer.tension_limit(), layer.compression_limit())
    else {
        return Err(WaveError::MissingThreshold { layer: index });
    };

    let extremes = StressExtremes::of(layer);
    let tension = extremes.max_tension.abs() > tension_limit;
    let compression = extremes.max_compression.abs() > compression_limit;

    let mode = match (tension, compression) {
        (true, true) => FailureMode::Both,
        (true, false) => FailureMode::Tension,
        (false, true) => FailureMode::Compression,
        (false, false) => return Ok(None),
    };
    Ok(Some(FailureReason {
        layer: index,
        mode,
        extremes,
    }))
}

/// Evaluate every relevant layer, skipping the impactor at index 0
///
/// A relevant layer without limits makes the whole evaluation invalid, which
/// is reported as `WaveError::MissingThreshold` rather than as a failure.
pub fn evaluate(layers: &[Layer]) -> Result<Verdict> {
    let relevant: Vec<(usize, &Layer)> = layers
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, layer)| layer.is_relevant())
        .collect();

    if let Some((index, _)) = relevant
        .iter()
        .find(|(_, l)| l.tension_limit().is_none() || l.compression_limit().is_none())
    {
        return Err(WaveError::MissingThreshold { layer: *index });
    }

    let mut reasons = Vec::new();
    for (index, layer) in relevant {
        if let Some(reason) = check_layer(index, layer)? {
            tracing::debug!(layer = index, mode = ?reason.mode, "layer exceeds failure stress");
            reasons.push(reason);
        }
    }

    if reasons.is_empty() {
        Ok(Verdict::Pass)
    } else {
        Ok(Verdict::Fail(reasons))
    }
}
