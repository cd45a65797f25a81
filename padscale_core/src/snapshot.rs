//! The published state surface consumed by presentation layers.

use crate::flow::{PourDirection, PourQuality};
use crate::recognizer::MeasurementSuggestion;
use crate::targets::TargetProgress;
use crate::units::WeightUnit;

/// One consistent view of everything the engine publishes. Produced whole
/// after each update; consumers never see a partially updated state.
#[derive(Debug, Clone, Default)]
pub struct ScaleSnapshot {
    /// Milliseconds since the engine epoch when this snapshot was taken.
    pub at_ms: u64,
    /// Filtered net weight (g).
    pub current_weight_g: f32,
    /// Display-smoothed weight (g); never negative.
    pub display_weight_g: f32,
    /// Whether anything is touching the surface.
    pub is_active: bool,
    /// Debounced stability flag.
    pub is_stable: bool,
    /// Unit the presentation layer should render in. All snapshot values
    /// stay in grams regardless.
    pub unit: WeightUnit,
    /// Entries currently on the tare stack.
    pub tare_depth: usize,
    /// Sum of displayed weights committed at each tare (g).
    pub running_total_g: f32,
    /// Running total plus the current net weight (g).
    pub session_total_g: f32,
    /// Magnitude of the average pour rate (g/s).
    pub pour_speed_g_per_s: f32,
    pub pour_direction: PourDirection,
    /// Smoothness verdict for the active pour, once enough history exists.
    pub pour_quality: Option<PourQuality>,
    /// Projected final weight of the active pour; 0 while not pouring.
    pub predicted_final_weight_g: f32,
    /// A container (or the surface itself) is about to overflow.
    pub capacity_warning: bool,
    /// A fresh container seems to have been set down; taring is suggested.
    pub auto_tare_suggested: bool,
    /// Ranked ingredient candidates for the last stable measurement.
    pub suggestions: Vec<MeasurementSuggestion>,
    /// Confidence of the top suggestion, or 0 when there is none.
    pub confidence: f32,
    /// Progress of every tracked target.
    pub targets: Vec<TargetProgress>,
    /// Name of the target currently being measured toward.
    pub active_target: Option<String>,
}
