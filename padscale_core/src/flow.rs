//! Pour flow analysis: direction, speed, smoothness, overflow prediction,
//! and learned container capacities.

use std::collections::VecDeque;

use crate::config::{CapacityCfg, FlowCfg};
use crate::history::{WeightHistory, WeightSample};

/// Direction of an active pour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PourDirection {
    In,
    Out,
    #[default]
    None,
}

/// Advisory smoothness classification for an active pour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PourQuality {
    Smooth,
    Irregular,
}

/// A learned container capacity signature.
#[derive(Debug, Clone)]
pub struct ContainerPattern {
    pub max_weight_g: f32,
    /// Rate fingerprint captured the last time this container was learned.
    pub pour_pattern: Vec<f32>,
    pub usage_count: u32,
}

/// Sliding-window rate analysis over the current weight stream.
///
/// Each update appends one sample, derives the average rate from the most
/// recent pairwise deltas, classifies the pour by the spread of recent
/// rates, and projects the final weight under a linear-deceleration
/// assumption. Zero time deltas skip the rate computation for that pair
/// rather than dividing by zero.
#[derive(Debug)]
pub struct FlowAnalyzer {
    cfg: FlowCfg,
    capacity: CapacityCfg,
    history: WeightHistory,
    rates: VecDeque<f32>,
    patterns: Vec<ContainerPattern>,
    avg_rate: f32,
    pour_speed: f32,
    direction: PourDirection,
    pouring: bool,
    quality: Option<PourQuality>,
    predicted_final_g: f32,
    capacity_warning: bool,
}

impl FlowAnalyzer {
    pub fn new(cfg: &FlowCfg, capacity: &CapacityCfg) -> Self {
        Self {
            cfg: *cfg,
            capacity: *capacity,
            history: WeightHistory::new(cfg.history),
            rates: VecDeque::with_capacity(cfg.variance_window),
            patterns: Vec::new(),
            avg_rate: 0.0,
            pour_speed: 0.0,
            direction: PourDirection::None,
            pouring: false,
            quality: None,
            predicted_final_g: 0.0,
            capacity_warning: false,
        }
    }

    /// Fold one weight sample in and refresh every derived signal.
    pub fn update(&mut self, current_g: f32, now_ms: u64) {
        let newest_rate = self.history.last().and_then(|prev| {
            let dt_ms = now_ms.saturating_sub(prev.at_ms);
            if dt_ms == 0 {
                None
            } else {
                Some((current_g - prev.grams) / (dt_ms as f32 / 1000.0))
            }
        });
        self.history.push(WeightSample {
            at_ms: now_ms,
            grams: current_g,
        });
        if let Some(rate) = newest_rate {
            if self.rates.len() == self.cfg.variance_window {
                self.rates.pop_front();
            }
            self.rates.push_back(rate);
        }

        self.avg_rate = self.recent_avg_rate();
        self.pour_speed = self.avg_rate.abs();
        let threshold = self.cfg.pour_threshold_g_per_s;
        self.pouring = self.pour_speed > threshold;
        self.direction = if self.avg_rate > threshold {
            PourDirection::In
        } else if self.avg_rate < -threshold {
            PourDirection::Out
        } else {
            PourDirection::None
        };

        self.quality = self.classify();
        self.predicted_final_g = self.predict(current_g);
        self.capacity_warning = self.check_capacity(current_g);
    }

    /// Average rate over pairwise deltas within the most recent samples.
    fn recent_avg_rate(&self) -> f32 {
        let tail: Vec<&WeightSample> = self.history.tail(self.cfg.rate_samples).collect();
        let mut sum = 0.0;
        let mut n = 0u32;
        for pair in tail.windows(2) {
            let dt_ms = pair[1].at_ms.saturating_sub(pair[0].at_ms);
            if dt_ms == 0 {
                continue;
            }
            sum += (pair[1].grams - pair[0].grams) / (dt_ms as f32 / 1000.0);
            n += 1;
        }
        if n == 0 { 0.0 } else { sum / n as f32 }
    }

    fn classify(&self) -> Option<PourQuality> {
        if !self.pouring
            || self.history.len() < self.cfg.min_classify_samples
            || self.rates.len() < 2
        {
            return None;
        }
        let spread = stddev(self.rates.iter().copied());
        if spread < self.cfg.smooth_variance && self.pour_speed > self.cfg.smooth_speed_g_per_s {
            Some(PourQuality::Smooth)
        } else if spread > self.cfg.irregular_variance {
            Some(PourQuality::Irregular)
        } else {
            None
        }
    }

    /// Predicted final weight assuming the pour decelerates linearly to zero
    /// over `pour_speed / decel_divisor` seconds. Zero while not pouring.
    fn predict(&self, current_g: f32) -> f32 {
        if !self.pouring || self.history.len() < self.cfg.min_predict_samples {
            return 0.0;
        }
        let time_to_stable_s = self.pour_speed / self.cfg.decel_divisor;
        current_g + self.pour_speed * time_to_stable_s
    }

    /// First learned pattern (or the surface's own capacity) whose threshold
    /// the current and predicted weights both cross wins.
    fn check_capacity(&self, current_g: f32) -> bool {
        let ratio = self.capacity.warn_fill_ratio;
        for p in &self.patterns {
            if current_g > ratio * p.max_weight_g && self.predicted_final_g > p.max_weight_g {
                return true;
            }
        }
        current_g > ratio * self.capacity.max_weight_g
            && self.predicted_final_g > self.capacity.max_weight_g
    }

    /// Learn (or reinforce) a container capacity. Capacities within the merge
    /// distance of an existing pattern average into it instead of duplicating.
    pub fn learn_pattern(&mut self, max_weight_g: f32) {
        if !max_weight_g.is_finite() || max_weight_g <= 0.0 {
            tracing::warn!(max_weight_g, "ignoring degenerate container capacity");
            return;
        }
        let fingerprint: Vec<f32> = self.rates.iter().copied().collect();
        if let Some(existing) = self
            .patterns
            .iter_mut()
            .find(|p| (p.max_weight_g - max_weight_g).abs() <= self.cfg.pattern_merge_g)
        {
            existing.max_weight_g = (existing.max_weight_g + max_weight_g) / 2.0;
            existing.usage_count += 1;
            if !fingerprint.is_empty() {
                existing.pour_pattern = fingerprint;
            }
            tracing::debug!(
                max_weight_g = existing.max_weight_g,
                usage_count = existing.usage_count,
                "merged container pattern"
            );
        } else {
            self.patterns.push(ContainerPattern {
                max_weight_g,
                pour_pattern: fingerprint,
                usage_count: 1,
            });
            tracing::debug!(max_weight_g, "learned container pattern");
        }
    }

    pub fn avg_rate(&self) -> f32 {
        self.avg_rate
    }

    pub fn pour_speed(&self) -> f32 {
        self.pour_speed
    }

    pub fn direction(&self) -> PourDirection {
        self.direction
    }

    pub fn is_pouring(&self) -> bool {
        self.pouring
    }

    pub fn quality(&self) -> Option<PourQuality> {
        self.quality
    }

    pub fn predicted_final_g(&self) -> f32 {
        self.predicted_final_g
    }

    pub fn capacity_warning(&self) -> bool {
        self.capacity_warning
    }

    pub fn patterns(&self) -> &[ContainerPattern] {
        &self.patterns
    }

    /// Clear the analysis window and transient signals. Learned patterns
    /// survive; they are knowledge about containers, not about this session.
    pub fn reset(&mut self) {
        self.history.clear();
        self.rates.clear();
        self.avg_rate = 0.0;
        self.pour_speed = 0.0;
        self.direction = PourDirection::None;
        self.pouring = false;
        self.quality = None;
        self.predicted_final_g = 0.0;
        self.capacity_warning = false;
    }
}

/// Population standard deviation.
fn stddev(values: impl Iterator<Item = f32> + Clone) -> f32 {
    let n = values.clone().count();
    if n == 0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f32>() / n as f32;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f32>() / n as f32;
    var.sqrt()
}

#[cfg(test)]
mod stddev_tests {
    use super::stddev;

    #[test]
    fn constant_values_have_zero_spread() {
        let v = [4.0f32; 6];
        assert!(stddev(v.iter().copied()) < 1e-6);
    }

    #[test]
    fn known_spread() {
        // mean 5, deviations +-3 -> stddev 3
        let v = [2.0f32, 8.0, 2.0, 8.0];
        assert!((stddev(v.iter().copied()) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(stddev(std::iter::empty::<f32>()), 0.0);
    }
}
