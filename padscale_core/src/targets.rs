//! Target quantity tracking: completion events for upstream recipe steps.

/// One requested quantity, parsed upstream from a recipe or plan.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetQuantity {
    pub name: String,
    pub grams: f32,
}

/// Published progress for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetProgress {
    pub name: String,
    pub target_g: f32,
    /// Weight observed when the target completed; 0 until then.
    pub measured_g: f32,
    pub completed: bool,
}

/// Completion tolerance for a target: generous for large quantities,
/// never tighter than 2 g.
#[inline]
pub fn completion_tolerance_g(target_g: f32) -> f32 {
    2.0f32.max(0.02 * target_g)
}

/// Walks an ordered list of targets, latching each completion when the
/// current weight enters the target's tolerance band, then advancing.
/// A completed target stays completed even if the weight drifts back out.
#[derive(Debug, Default)]
pub struct TargetTracker {
    targets: Vec<TargetQuantity>,
    progress: Vec<TargetProgress>,
    active: usize,
}

impl TargetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the target list. Degenerate entries (non-finite or
    /// non-positive grams) are dropped with a warning rather than tracked.
    pub fn set_targets(&mut self, targets: Vec<TargetQuantity>) {
        let mut kept = Vec::with_capacity(targets.len());
        for t in targets {
            if t.grams.is_finite() && t.grams > 0.0 {
                kept.push(t);
            } else {
                tracing::warn!(name = %t.name, grams = t.grams, "dropping degenerate target");
            }
        }
        self.progress = kept
            .iter()
            .map(|t| TargetProgress {
                name: t.name.clone(),
                target_g: t.grams,
                measured_g: 0.0,
                completed: false,
            })
            .collect();
        self.targets = kept;
        self.active = 0;
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.progress.clear();
        self.active = 0;
    }

    /// Check the active target against the current weight. Returns the index
    /// of a target completed by this update, if any, after advancing.
    pub fn update(&mut self, current_g: f32) -> Option<usize> {
        let idx = self.active;
        let target = self.targets.get(idx)?;
        if (current_g - target.grams).abs() <= completion_tolerance_g(target.grams) {
            self.progress[idx].completed = true;
            self.progress[idx].measured_g = current_g;
            self.active += 1;
            Some(idx)
        } else {
            None
        }
    }

    pub fn active_target(&self) -> Option<&TargetQuantity> {
        self.targets.get(self.active)
    }

    pub fn progress(&self) -> &[TargetProgress] {
        &self.progress
    }

    /// Names of targets completed so far, in completion order.
    pub fn completed_names(&self) -> Vec<String> {
        self.progress
            .iter()
            .filter(|p| p.completed)
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn all_done(&self) -> bool {
        !self.targets.is_empty() && self.active >= self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
