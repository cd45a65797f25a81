//! `From` implementations bridging `padscale_config` types to
//! `padscale_core` types.
//!
//! These keep the TOML schema and the runtime structs decoupled without
//! field-by-field mapping in the CLI.

use crate::config::{
    CapacityCfg, DisplayCfg, FilterCfg, FlowCfg, RecognizerCfg, ScaleConfig, StabilityCfg, TareCfg,
};
use crate::recognizer::{IngredientProfile, IngredientTable};
use crate::units::WeightUnit;

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl From<&padscale_config::FilterCfg> for FilterCfg {
    fn from(c: &padscale_config::FilterCfg) -> Self {
        Self {
            process_noise: c.process_noise,
            measurement_noise: c.measurement_noise,
            history: c.history,
        }
    }
}

// ── DisplayCfg ───────────────────────────────────────────────────────────────

impl From<padscale_config::UnitCfg> for WeightUnit {
    fn from(u: padscale_config::UnitCfg) -> Self {
        match u {
            padscale_config::UnitCfg::Grams => Self::Grams,
            padscale_config::UnitCfg::Ounces => Self::Ounces,
        }
    }
}

impl From<&padscale_config::DisplayCfg> for DisplayCfg {
    fn from(c: &padscale_config::DisplayCfg) -> Self {
        Self {
            tick_hz: c.tick_hz,
            smoothing_alpha: c.smoothing_alpha,
            unit: c.unit.into(),
        }
    }
}

// ── StabilityCfg ─────────────────────────────────────────────────────────────

impl From<&padscale_config::StabilityCfg> for StabilityCfg {
    fn from(c: &padscale_config::StabilityCfg) -> Self {
        Self {
            epsilon_g: c.epsilon_g,
            hold_ms: c.hold_ms,
        }
    }
}

// ── FlowCfg ──────────────────────────────────────────────────────────────────

impl From<&padscale_config::FlowCfg> for FlowCfg {
    fn from(c: &padscale_config::FlowCfg) -> Self {
        Self {
            history: c.history,
            rate_samples: c.rate_samples,
            variance_window: c.variance_window,
            pour_threshold_g_per_s: c.pour_threshold_g_per_s,
            smooth_variance: c.smooth_variance,
            smooth_speed_g_per_s: c.smooth_speed_g_per_s,
            irregular_variance: c.irregular_variance,
            decel_divisor: c.decel_divisor,
            pattern_merge_g: c.pattern_merge_g,
            min_classify_samples: c.min_classify_samples,
            min_predict_samples: c.min_predict_samples,
        }
    }
}

// ── TareCfg ──────────────────────────────────────────────────────────────────

impl From<&padscale_config::TareCfg> for TareCfg {
    fn from(c: &padscale_config::TareCfg) -> Self {
        Self {
            max_depth: c.max_depth,
            auto_new_g: c.auto_new_g,
            auto_prior_g: c.auto_prior_g,
            running_total_min_g: c.running_total_min_g,
        }
    }
}

// ── RecognizerCfg ────────────────────────────────────────────────────────────

impl From<&padscale_config::RecognizerCfg> for RecognizerCfg {
    fn from(c: &padscale_config::RecognizerCfg) -> Self {
        Self {
            min_confidence: c.min_confidence,
            max_suggestions: c.max_suggestions,
            min_weight_g: c.min_weight_g,
        }
    }
}

// ── CapacityCfg ──────────────────────────────────────────────────────────────

impl From<&padscale_config::CapacityCfg> for CapacityCfg {
    fn from(c: &padscale_config::CapacityCfg) -> Self {
        Self {
            max_weight_g: c.max_weight_g,
            warn_fill_ratio: c.warn_fill_ratio,
        }
    }
}

// ── ScaleConfig ──────────────────────────────────────────────────────────────

impl From<&padscale_config::Config> for ScaleConfig {
    fn from(c: &padscale_config::Config) -> Self {
        Self {
            filter: (&c.filter).into(),
            display: (&c.display).into(),
            stability: (&c.stability).into(),
            flow: (&c.flow).into(),
            tare: (&c.tare).into(),
            recognizer: (&c.recognizer).into(),
            capacity: (&c.capacity).into(),
        }
    }
}

// ── Ingredient table ─────────────────────────────────────────────────────────

impl From<&padscale_config::IngredientRow> for IngredientProfile {
    fn from(r: &padscale_config::IngredientRow) -> Self {
        Self {
            name: r.name.trim().to_string(),
            typical_weight_g: r.typical_weight,
            density: r.density,
            category: r.category.trim().to_string(),
            followed_by: r
                .followed_by_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<&[padscale_config::IngredientRow]> for IngredientTable {
    /// Build a table from loaded CSV rows, keeping the default context rules.
    fn from(rows: &[padscale_config::IngredientRow]) -> Self {
        let profiles = rows.iter().map(IngredientProfile::from).collect();
        Self::new(profiles, Self::default_context_rules())
    }
}
