//! Recursive noise filter for the raw pressure signal.

/// One-state Kalman filter over a scalar weight reading.
///
/// State is `(estimate, covariance)`, starting at `(0, 1)`. Each `update`
/// folds one measurement in: the covariance grows by the process noise,
/// the gain weighs it against the measurement noise, and the estimate moves
/// toward the measurement by that gain. Deterministic, no failure modes.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    process_noise: f32,
    measurement_noise: f32,
    estimate: f32,
    covariance: f32,
}

impl NoiseFilter {
    pub fn new(process_noise: f32, measurement_noise: f32) -> Self {
        Self {
            process_noise,
            measurement_noise,
            estimate: 0.0,
            covariance: 1.0,
        }
    }

    /// Fold one measurement into the estimate and return the new estimate.
    ///
    /// Non-finite measurements are rejected; the previous estimate is
    /// returned unchanged.
    pub fn update(&mut self, measurement: f32) -> f32 {
        if !measurement.is_finite() {
            return self.estimate;
        }
        let predicted = self.covariance + self.process_noise;
        let gain = predicted / (predicted + self.measurement_noise);
        self.estimate += gain * (measurement - self.estimate);
        self.covariance = (1.0 - gain) * predicted;
        self.estimate
    }

    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    pub fn covariance(&self) -> f32 {
        self.covariance
    }

    /// Restore the initial state: estimate 0, covariance 1.
    pub fn reset(&mut self) {
        self.estimate = 0.0;
        self.covariance = 1.0;
    }
}
