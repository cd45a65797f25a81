//! Configuration types for the scale engine.
//!
//! These are the runtime configuration structs used by `ScaleEngine`.
//! They are separate from the TOML-deserialized config in `padscale_config`.

use crate::units::WeightUnit;

/// Noise filter configuration for the raw pressure signal.
#[derive(Debug, Clone, Copy)]
pub struct FilterCfg {
    /// Kalman process noise: drift allowed in the estimate per step.
    pub process_noise: f32,
    /// Kalman measurement noise: distrust of a single reading.
    pub measurement_noise: f32,
    /// Raw gross readings retained for inspection and trend analysis.
    pub history: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            process_noise: 0.01,
            measurement_noise: 0.1,
            history: 100,
        }
    }
}

/// Display smoothing configuration.
#[derive(Debug, Clone, Copy)]
pub struct DisplayCfg {
    /// Tick rate for display smoothing in Hz. Correctness does not depend
    /// on the exact rate; it only shapes how fast the display settles.
    pub tick_hz: u32,
    /// EMA weight on the previous displayed value, in `[0.0, 1.0)`.
    pub smoothing_alpha: f32,
    /// Startup display unit.
    pub unit: WeightUnit,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            smoothing_alpha: 0.9,
            unit: WeightUnit::Grams,
        }
    }
}

/// Stability debounce configuration.
#[derive(Debug, Clone, Copy)]
pub struct StabilityCfg {
    /// Max deviation from the settling anchor that still counts as settled (g).
    pub epsilon_g: f32,
    /// Time the reading must hold within epsilon before it is stable (ms).
    pub hold_ms: u64,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            epsilon_g: 0.1,
            hold_ms: 500,
        }
    }
}

/// Pour flow analysis configuration.
#[derive(Debug, Clone, Copy)]
pub struct FlowCfg {
    /// Weight samples retained for flow analysis.
    pub history: usize,
    /// Samples used per flow-rate estimate (pairwise deltas).
    pub rate_samples: usize,
    /// Recent pairwise rates kept for the spread classification.
    pub variance_window: usize,
    /// Average rate above which a pour is in progress (g/s).
    pub pour_threshold_g_per_s: f32,
    /// Rate spread below this, with speed above `smooth_speed_g_per_s`,
    /// classifies the pour as smooth.
    pub smooth_variance: f32,
    pub smooth_speed_g_per_s: f32,
    /// Rate spread above this classifies the pour as irregular.
    pub irregular_variance: f32,
    /// Deceleration divisor for the time-to-stable estimate: the pour is
    /// assumed to slow to zero in `pour_speed / decel_divisor` seconds.
    pub decel_divisor: f32,
    /// Container weights within this distance merge into one learned pattern.
    pub pattern_merge_g: f32,
    /// History length required before a pour is classified.
    pub min_classify_samples: usize,
    /// History length required before the final weight is predicted.
    pub min_predict_samples: usize,
}

impl Default for FlowCfg {
    fn default() -> Self {
        Self {
            history: 50,
            rate_samples: 3,
            variance_window: 9,
            pour_threshold_g_per_s: 2.0,
            smooth_variance: 0.5,
            smooth_speed_g_per_s: 5.0,
            irregular_variance: 2.0,
            decel_divisor: 2.0,
            pattern_merge_g: 10.0,
            min_classify_samples: 10,
            min_predict_samples: 5,
        }
    }
}

/// Tare stack configuration.
#[derive(Debug, Clone, Copy)]
pub struct TareCfg {
    /// Max nested tare entries; the oldest is discarded on overflow, so undo
    /// beyond this depth is impossible.
    pub max_depth: usize,
    /// A stable weight at or above this suggests a new container was set down...
    pub auto_new_g: f32,
    /// ...provided the previous stable weight was at or below this.
    pub auto_prior_g: f32,
    /// Displayed weights above this are added to the running total on tare.
    pub running_total_min_g: f32,
}

impl Default for TareCfg {
    fn default() -> Self {
        Self {
            max_depth: 10,
            auto_new_g: 50.0,
            auto_prior_g: 5.0,
            running_total_min_g: 0.1,
        }
    }
}

/// Ingredient recognizer configuration.
#[derive(Debug, Clone, Copy)]
pub struct RecognizerCfg {
    /// Weight-match candidates below this confidence are discarded.
    pub min_confidence: f32,
    /// Max suggestions surfaced per stable measurement.
    pub max_suggestions: usize,
    /// Stable weights below this are ignored (empty-platform noise).
    pub min_weight_g: f32,
}

impl Default for RecognizerCfg {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            max_suggestions: 3,
            min_weight_g: 1.0,
        }
    }
}

/// Surface capacity configuration. The surface's own rated capacity is
/// checked alongside learned container patterns.
#[derive(Debug, Clone, Copy)]
pub struct CapacityCfg {
    /// Rated capacity of the surface in grams.
    pub max_weight_g: f32,
    /// Fraction of a capacity at which the near-full warning arms.
    pub warn_fill_ratio: f32,
}

impl Default for CapacityCfg {
    fn default() -> Self {
        Self {
            max_weight_g: 5000.0,
            warn_fill_ratio: 0.9,
        }
    }
}

/// Aggregate engine configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleConfig {
    pub filter: FilterCfg,
    pub display: DisplayCfg,
    pub stability: StabilityCfg,
    pub flow: FlowCfg,
    pub tare: TareCfg,
    pub recognizer: RecognizerCfg,
    pub capacity: CapacityCfg,
}
