//! Simulated touch surfaces for demos and tests.
//!
//! `ScriptedSurface` replays a prepared batch sequence with per-batch
//! delays; `PourSimulator` synthesizes a whole kitchen session (container
//! down, settle, pour with noise, hold) without any hardware.

pub mod noise;
pub mod trace;

use std::collections::VecDeque;
use std::error::Error;
use std::time::Duration;

use padscale_traits::{TouchBatch, TouchContact, TouchSurface};

use crate::noise::Gauss32;

/// Single-contact batch for a weight reading; non-positive weights are an
/// empty surface.
pub fn weight_batch(grams: f32) -> TouchBatch {
    if grams <= 0.0 {
        return TouchBatch::default();
    }
    TouchBatch::new(vec![TouchContact {
        contact_id: 0,
        pressure: grams,
        active: true,
    }])
}

/// One scripted delivery: wait, then hand over the batch.
#[derive(Debug, Clone)]
pub struct ScriptedBatch {
    pub delay: Duration,
    pub batch: TouchBatch,
}

/// Surface that replays a prepared sequence, then ends its stream.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    queue: VecDeque<ScriptedBatch>,
}

impl ScriptedSurface {
    pub fn new(batches: impl IntoIterator<Item = ScriptedBatch>) -> Self {
        Self {
            queue: batches.into_iter().collect(),
        }
    }

    /// Build from (grams, delay-ms) pairs; 0 g becomes an empty batch.
    pub fn from_weights(rows: impl IntoIterator<Item = (f32, u64)>) -> Self {
        Self::new(rows.into_iter().map(|(grams, ms)| ScriptedBatch {
            delay: Duration::from_millis(ms),
            batch: weight_batch(grams),
        }))
    }

    pub fn push(&mut self, entry: ScriptedBatch) {
        self.queue.push_back(entry);
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl TouchSurface for ScriptedSurface {
    fn next_batch(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<TouchBatch>, Box<dyn Error + Send + Sync>> {
        match self.queue.pop_front() {
            Some(entry) => {
                if !entry.delay.is_zero() {
                    std::thread::sleep(entry.delay);
                }
                Ok(Some(entry.batch))
            }
            None => Ok(None),
        }
    }
}

/// Tuning for a simulated pour session.
#[derive(Debug, Clone, Copy)]
pub struct PourProfile {
    /// Weight of the container placed first (g).
    pub container_g: f32,
    /// Net amount to pour (g).
    pub target_g: f32,
    /// Pour rate (g/s).
    pub rate_g_per_s: f32,
    /// Sensor noise sigma (g).
    pub sigma_g: f32,
    /// Sample period of the simulated surface; drives the pour timeline.
    pub interval: Duration,
    /// Sleep `interval` between batches to mimic a live surface.
    pub realtime: bool,
    /// Samples to hold at each plateau before moving on.
    pub settle_samples: u32,
}

impl Default for PourProfile {
    fn default() -> Self {
        Self {
            container_g: 150.0,
            target_g: 250.0,
            rate_g_per_s: 8.0,
            sigma_g: 0.15,
            interval: Duration::from_millis(16),
            realtime: true,
            settle_samples: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Empty,
    SettleContainer,
    Pour,
    Hold,
    Done,
}

/// Synthesizes one full pour session as a touch surface.
///
/// Empty surface, container placed, settle, pour at the configured rate
/// with Gaussian noise, settle again, end of stream. Deterministic for a
/// given seed.
#[derive(Debug)]
pub struct PourSimulator {
    profile: PourProfile,
    gauss: Gauss32,
    phase: Phase,
    true_g: f32,
    phase_left: u32,
}

impl PourSimulator {
    pub fn new(profile: PourProfile, seed: u32) -> Self {
        Self {
            profile,
            gauss: Gauss32::new(seed),
            phase: Phase::Empty,
            true_g: 0.0,
            phase_left: profile.settle_samples.max(1),
        }
    }

    fn noisy(&mut self) -> TouchBatch {
        let noise = self.profile.sigma_g * self.gauss.next_std();
        weight_batch(self.true_g + noise)
    }

    fn advance(&mut self) -> Option<TouchBatch> {
        match self.phase {
            Phase::Empty => {
                if self.phase_left == 0 {
                    self.true_g = self.profile.container_g;
                    self.phase = Phase::SettleContainer;
                    self.phase_left = self.profile.settle_samples.max(1);
                    tracing::debug!(container_g = self.true_g, "container placed");
                    return Some(self.noisy());
                }
                self.phase_left -= 1;
                Some(TouchBatch::default())
            }
            Phase::SettleContainer => {
                if self.phase_left == 0 {
                    self.phase = Phase::Pour;
                    tracing::debug!(rate_g_per_s = self.profile.rate_g_per_s, "pour started");
                }
                self.phase_left = self.phase_left.saturating_sub(1);
                Some(self.noisy())
            }
            Phase::Pour => {
                let step = self.profile.rate_g_per_s * self.profile.interval.as_secs_f32();
                self.true_g += step;
                let full = self.profile.container_g + self.profile.target_g;
                if self.true_g >= full {
                    self.true_g = full;
                    self.phase = Phase::Hold;
                    self.phase_left = self.profile.settle_samples.max(1);
                    tracing::debug!(total_g = self.true_g, "pour finished");
                }
                Some(self.noisy())
            }
            Phase::Hold => {
                if self.phase_left == 0 {
                    self.phase = Phase::Done;
                    return None;
                }
                self.phase_left -= 1;
                Some(self.noisy())
            }
            Phase::Done => None,
        }
    }
}

impl TouchSurface for PourSimulator {
    fn next_batch(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<TouchBatch>, Box<dyn Error + Send + Sync>> {
        let out = self.advance();
        if out.is_some() && self.profile.realtime && !self.profile.interval.is_zero() {
            std::thread::sleep(self.profile.interval);
        }
        Ok(out)
    }
}
