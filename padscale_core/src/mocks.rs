//! Test and helper mocks for padscale_core.

use std::sync::{Arc, Mutex};

use padscale_traits::{CalibrationStore, FeedbackEvent, FeedbackSink};

/// Calibration store backed by a plain field; useful for engine tests and
/// for running without persistence at all.
#[derive(Debug, Default, Clone)]
pub struct MemoryCalibrationStore {
    value: Option<f32>,
}

impl MemoryCalibrationStore {
    pub fn new(value: Option<f32>) -> Self {
        Self { value }
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn load(&mut self) -> Result<Option<f32>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.value)
    }

    fn store(&mut self, offset_g: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.value = Some(offset_g);
        Ok(())
    }
}

/// Calibration store that fails every operation; exercises the fall-back-to-
/// zero path.
#[derive(Debug, Default)]
pub struct FailingCalibrationStore;

impl CalibrationStore for FailingCalibrationStore {
    fn load(&mut self) -> Result<Option<f32>, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("calibration store offline")))
    }

    fn store(&mut self, _offset_g: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("calibration store offline")))
    }
}

/// Sink that drops every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn notify(&mut self, _event: FeedbackEvent) {}
}

/// Sink that records events behind a shared handle for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<FeedbackEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the recorded events; clone freely across threads.
    pub fn events(&self) -> Arc<Mutex<Vec<FeedbackEvent>>> {
        self.events.clone()
    }

    pub fn take(&self) -> Vec<FeedbackEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }
}

impl FeedbackSink for RecordingSink {
    fn notify(&mut self, event: FeedbackEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
