//! Commands accepted by the engine.

use crate::targets::TargetQuantity;

/// Every mutation that does not arrive as a raw sample or a tick comes in as
/// a command, serialized through the service's channel onto the one thread
/// that owns engine state.
#[derive(Debug, Clone)]
pub enum Command {
    /// Zero the scale at the current reading.
    Tare,
    /// Revert the most recent tare; no-op when the stack is empty.
    UndoTare,
    /// Flip the display unit between grams and ounces.
    ToggleUnit,
    /// Set and persist the calibration offset (clamped to the valid range).
    SetCalibrationOffset(f32),
    /// Record a container capacity for overflow prediction.
    LearnContainerPattern { max_weight_g: f32 },
    /// Replace the tracked target quantities.
    SetTargets(Vec<TargetQuantity>),
    /// Drop all tracked targets.
    ClearTargets,
    /// Replace the recognition context words (recipe keywords and the like).
    SetContextWords(Vec<String>),
}
