//! Raw touch batches in, calibrated and filtered weight out.

use padscale_traits::TouchBatch;

use crate::config::{DisplayCfg, FilterCfg};
use crate::filter::NoiseFilter;
use crate::history::{WeightHistory, WeightSample};

/// Calibration offsets outside this range are clamped; non-finite values
/// reset to 0.
pub const CAL_OFFSET_MIN_G: f32 = -5.0;
pub const CAL_OFFSET_MAX_G: f32 = 5.0;

/// Normalize a calibration offset to the supported range.
#[inline]
pub fn clamp_calibration_offset(offset_g: f32) -> f32 {
    if offset_g.is_finite() {
        offset_g.clamp(CAL_OFFSET_MIN_G, CAL_OFFSET_MAX_G)
    } else {
        0.0
    }
}

/// Turns per-contact pressure batches into the current weight.
///
/// Per batch: sum the active contact pressures, add the calibration offset,
/// clamp at zero, run the noise filter, subtract the tare offset, clamp at
/// zero again. A batch with no active contact reads as zero without touching
/// the filter. The display weight is smoothed separately on a fixed-rate
/// tick so display steadiness does not depend on sensor timing jitter.
#[derive(Debug)]
pub struct MeasurementPipeline {
    filter: NoiseFilter,
    raw_history: WeightHistory,
    calibration_offset_g: f32,
    smoothing_alpha: f32,
    current_weight_g: f32,
    display_weight_g: f32,
    is_active: bool,
}

impl MeasurementPipeline {
    pub fn new(filter: &FilterCfg, display: &DisplayCfg) -> Self {
        Self {
            filter: NoiseFilter::new(filter.process_noise, filter.measurement_noise),
            raw_history: WeightHistory::new(filter.history),
            calibration_offset_g: 0.0,
            smoothing_alpha: display.smoothing_alpha,
            current_weight_g: 0.0,
            display_weight_g: 0.0,
            is_active: false,
        }
    }

    /// Process one raw batch and return the new current weight.
    pub fn ingest(&mut self, batch: &TouchBatch, tare_offset_g: f32, now_ms: u64) -> f32 {
        if !batch.has_active_contact() {
            self.is_active = false;
            self.current_weight_g = 0.0;
            return 0.0;
        }
        self.is_active = true;
        let gross = batch.active_pressure() + self.calibration_offset_g;
        let gross = if gross.is_finite() { gross.max(0.0) } else { 0.0 };
        self.raw_history.push(WeightSample {
            at_ms: now_ms,
            grams: gross,
        });
        let filtered = self.filter.update(gross);
        self.current_weight_g = (filtered - tare_offset_g).max(0.0);
        self.current_weight_g
    }

    /// One display tick: move the displayed weight toward the current weight
    /// by the EMA factor. Returns the new display weight.
    pub fn tick(&mut self) -> f32 {
        let a = self.smoothing_alpha;
        self.display_weight_g = self.display_weight_g * a + self.current_weight_g * (1.0 - a);
        self.display_weight_g
    }

    pub fn set_calibration_offset(&mut self, offset_g: f32) {
        self.calibration_offset_g = clamp_calibration_offset(offset_g);
    }

    pub fn calibration_offset(&self) -> f32 {
        self.calibration_offset_g
    }

    pub fn current_weight(&self) -> f32 {
        self.current_weight_g
    }

    pub fn display_weight(&self) -> f32 {
        self.display_weight_g
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn raw_history(&self) -> &WeightHistory {
        &self.raw_history
    }

    /// Clear filter state, history, and outputs. Calibration survives; it is
    /// a property of the hardware, not of the session.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.raw_history.clear();
        self.current_weight_g = 0.0;
        self.display_weight_g = 0.0;
        self.is_active = false;
    }
}
