//! Debounced stability detection over the displayed weight.

use crate::config::StabilityCfg;

/// Stability machine state. `Settling` carries the time the hold began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityState {
    Unstable,
    Settling { since_ms: u64 },
    Stable,
}

/// Hysteresis state machine: a reading is stable only after it has held
/// within epsilon of the anchor for the full hold duration. A single sample
/// crossing the band resets the debounce, it never flips the flag directly.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    epsilon_g: f32,
    hold_ms: u64,
    state: StabilityState,
    anchor_g: f32,
}

impl StabilityDetector {
    pub fn new(cfg: &StabilityCfg) -> Self {
        Self {
            epsilon_g: cfg.epsilon_g,
            hold_ms: cfg.hold_ms,
            state: StabilityState::Unstable,
            anchor_g: 0.0,
        }
    }

    /// Fold one displayed weight in and return the resulting state.
    pub fn update(&mut self, display_g: f32, now_ms: u64) -> StabilityState {
        let delta = (display_g - self.anchor_g).abs();
        if delta < self.epsilon_g {
            match self.state {
                StabilityState::Unstable => {
                    self.state = StabilityState::Settling { since_ms: now_ms };
                }
                StabilityState::Settling { since_ms }
                    if now_ms.saturating_sub(since_ms) > self.hold_ms =>
                {
                    self.state = StabilityState::Stable;
                }
                // Still settling or already stable: hold position
                _ => {}
            }
        } else {
            self.anchor_g = display_g;
            self.state = StabilityState::Unstable;
        }
        self.state
    }

    pub fn is_stable(&self) -> bool {
        matches!(self.state, StabilityState::Stable)
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    /// The weight the debounce is currently anchored to.
    pub fn anchor_g(&self) -> f32 {
        self.anchor_g
    }

    pub fn reset(&mut self) {
        self.state = StabilityState::Unstable;
        self.anchor_g = 0.0;
    }
}
