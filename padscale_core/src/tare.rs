//! Bounded tare stack and the running total of tared amounts.

use crate::config::TareCfg;

#[derive(Debug, Clone, Copy)]
struct TareEntry {
    /// Cumulative offset active while this entry is on top (g).
    total_offset: f32,
    /// Amount added to the running total when this entry was pushed (g).
    committed: f32,
}

/// Stack of zero-offsets, most recent last, capped at a fixed depth.
///
/// Entries store the cumulative offset, so the active offset is always the
/// top of the stack. When the cap is reached the oldest entry is discarded;
/// undo beyond the cap is impossible and the discarded entry's contribution
/// stays in the running total. That is an accepted limit of the depth bound,
/// not something undo tries to reconstruct.
#[derive(Debug, Clone)]
pub struct TareManager {
    stack: Vec<TareEntry>,
    cap: usize,
    running_total: f32,
    min_commit_g: f32,
}

impl TareManager {
    pub fn new(cfg: &TareCfg) -> Self {
        Self {
            stack: Vec::with_capacity(cfg.max_depth),
            cap: cfg.max_depth.max(1),
            running_total: 0.0,
            min_commit_g: cfg.running_total_min_g,
        }
    }

    /// Zero the scale at the current reading.
    ///
    /// `current_g` is the net weight before taring; it becomes the delta added
    /// to the cumulative offset. `display_g` above the commit threshold is
    /// credited to the running total.
    pub fn tare(&mut self, current_g: f32, display_g: f32) {
        let delta = if current_g.is_finite() {
            current_g.max(0.0)
        } else {
            0.0
        };
        let total = self.offset() + delta;
        if self.stack.len() == self.cap {
            self.stack.remove(0);
        }
        let committed = if display_g.is_finite() && display_g > self.min_commit_g {
            display_g
        } else {
            0.0
        };
        self.running_total += committed;
        self.stack.push(TareEntry {
            total_offset: total,
            committed,
        });
    }

    /// Revert the most recent tare. No-op on an empty stack.
    ///
    /// Returns whether an entry was actually reverted.
    pub fn undo(&mut self) -> bool {
        match self.stack.pop() {
            Some(entry) => {
                self.running_total -= entry.committed;
                true
            }
            None => false,
        }
    }

    /// The active cumulative offset subtracted from filtered weight (g).
    pub fn offset(&self) -> f32 {
        self.stack.last().map_or(0.0, |e| e.total_offset)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Sum of displayed weights committed at each tare (g).
    pub fn running_total(&self) -> f32 {
        self.running_total
    }

    /// Drop all offsets and zero the running total.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.running_total = 0.0;
    }
}
