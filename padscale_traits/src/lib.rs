//! Boundary traits for the padscale engine.
//!
//! The engine never talks to a sensor, a persistence file, or a haptics
//! device directly; it only sees these traits. Implementations live in
//! `padscale_sim`, `padscale_config`, and whatever presentation layer
//! embeds the engine.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// A single contact reported by the touch surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchContact {
    /// Surface-assigned contact identifier; stable for the contact's lifetime.
    pub contact_id: u32,
    /// Pressure reading for this contact. Unit is grams-equivalent after
    /// the surface's own linearization; never negative from a sane source.
    pub pressure: f32,
    /// Whether the contact is currently active (touching).
    pub active: bool,
}

/// One batch of contacts delivered together.
///
/// An empty batch (or one with no active contacts) means nothing is on the
/// surface and is a normal reading, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchBatch {
    pub contacts: Vec<TouchContact>,
}

impl TouchBatch {
    pub fn new(contacts: Vec<TouchContact>) -> Self {
        Self { contacts }
    }

    /// Sum of pressures over active contacts.
    pub fn active_pressure(&self) -> f32 {
        self.contacts
            .iter()
            .filter(|c| c.active)
            .map(|c| c.pressure)
            .sum()
    }

    /// True when at least one contact is active.
    pub fn has_active_contact(&self) -> bool {
        self.contacts.iter().any(|c| c.active)
    }
}

/// Source of raw touch batches (the sensor side of the system).
///
/// `next_batch` blocks up to `timeout` waiting for the next delivery.
/// `Ok(None)` signals the end of the stream (e.g. a replay file ran out);
/// a timeout with no data should be reported as an error by implementations
/// that consider it abnormal, or as an empty batch by those that do not.
pub trait TouchSurface {
    fn next_batch(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<TouchBatch>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Persistence for the single calibration offset (grams).
///
/// `load` returns `Ok(None)` when no value has ever been stored; corrupt
/// storage should surface as `Err` so the caller can log and fall back to
/// the 0.0 default.
pub trait CalibrationStore {
    fn load(&mut self) -> Result<Option<f32>, Box<dyn std::error::Error + Send + Sync>>;
    fn store(&mut self, offset_g: f32)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Events the engine emits toward a haptics/audio feedback device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackEvent {
    /// Pour is fast and even; gentle positive cue.
    GoodFlow,
    /// Pour rate is erratic; corrective cue.
    IrregularFlow,
    /// Predicted final weight exceeds a learned container capacity.
    CapacityWarning,
    /// A tare command was applied.
    TareCompleted,
    /// The active measurement target was hit within tolerance.
    TargetReached,
}

/// Fire-and-forget feedback notifications. The engine never waits on the
/// sink and never observes a result; implementations must not block.
pub trait FeedbackSink {
    fn notify(&mut self, event: FeedbackEvent);
}
