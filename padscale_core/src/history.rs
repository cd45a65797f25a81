//! Bounded sample history shared by the pipeline and flow analysis.

use std::collections::VecDeque;

/// One observed weight with its arrival time in ms since the engine epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSample {
    pub at_ms: u64,
    pub grams: f32,
}

/// Append-only ring of recent samples; the oldest entry is evicted once the
/// capacity is reached. Insertion order is the only meaningful order.
#[derive(Debug, Clone)]
pub struct WeightHistory {
    buf: VecDeque<WeightSample>,
    cap: usize,
}

impl WeightHistory {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            buf: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, sample: WeightSample) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn last(&self) -> Option<&WeightSample> {
        self.buf.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightSample> {
        self.buf.iter()
    }

    /// The most recent `n` samples, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &WeightSample> {
        self.buf.iter().skip(self.buf.len().saturating_sub(n))
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
