//! The scale engine: one owner for all measurement state.
//!
//! Raw batches, display ticks, and commands all mutate state through this
//! one struct, so running it on a single thread (see `service`) is enough to
//! satisfy the single-writer model. The engine itself does no I/O beyond
//! the calibration store it was handed and never blocks.

use std::sync::Arc;
use std::time::Instant;

use padscale_traits::clock::{Clock, MonotonicClock};
use padscale_traits::{CalibrationStore, FeedbackEvent, FeedbackSink, TouchBatch};

use crate::command::Command;
use crate::config::ScaleConfig;
use crate::error::{BuildError, Result};
use crate::flow::{FlowAnalyzer, PourQuality};
use crate::mocks::{MemoryCalibrationStore, NullSink};
use crate::pipeline::{MeasurementPipeline, clamp_calibration_offset};
use crate::recognizer::{IngredientRecognizer, IngredientTable, MeasurementSuggestion};
use crate::snapshot::ScaleSnapshot;
use crate::stability::StabilityDetector;
use crate::tare::TareManager;
use crate::targets::TargetTracker;
use crate::units::WeightUnit;

pub struct ScaleEngine {
    cfg: ScaleConfig,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    pipeline: MeasurementPipeline,
    tare: TareManager,
    stability: StabilityDetector,
    flow: FlowAnalyzer,
    recognizer: IngredientRecognizer,
    targets: TargetTracker,
    cal_store: Box<dyn CalibrationStore + Send>,
    feedback: Box<dyn FeedbackSink + Send>,
    unit: WeightUnit,
    // Stability edge tracking for recognition and auto-tare
    was_stable: bool,
    prev_stable_g: f32,
    auto_tare_suggested: bool,
    context_words: Vec<String>,
    suggestions: Vec<MeasurementSuggestion>,
    // Feedback edge tracking
    last_quality: Option<PourQuality>,
    capacity_warned: bool,
    snapshot: ScaleSnapshot,
}

impl core::fmt::Debug for ScaleEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScaleEngine")
            .field("current_weight_g", &self.pipeline.current_weight())
            .field("display_weight_g", &self.pipeline.display_weight())
            .field("tare_depth", &self.tare.depth())
            .field("is_stable", &self.stability.is_stable())
            .finish()
    }
}

impl ScaleEngine {
    pub fn builder() -> ScaleEngineBuilder {
        ScaleEngineBuilder::default()
    }

    /// Process one raw touch batch.
    pub fn ingest(&mut self, batch: &TouchBatch) {
        let now = self.clock.ms_since(self.epoch);
        self.pipeline.ingest(batch, self.tare.offset(), now);
        self.refresh_snapshot(now);
    }

    /// One display tick: smooth the display weight and run every analysis
    /// that hangs off the weight stream.
    pub fn tick(&mut self) {
        let now = self.clock.ms_since(self.epoch);
        let display = self.pipeline.tick();
        let current = self.pipeline.current_weight();

        self.stability.update(display, now);
        let stable = self.stability.is_stable();
        if stable && !self.was_stable {
            self.on_stable_edge(display);
        }
        self.was_stable = stable;
        if self.auto_tare_suggested && display < self.cfg.tare.auto_prior_g {
            // Container came back off before anyone tared
            self.auto_tare_suggested = false;
        }

        self.flow.update(current, now);
        let quality = self.flow.quality();
        if quality != self.last_quality {
            match quality {
                Some(PourQuality::Smooth) => self.feedback.notify(FeedbackEvent::GoodFlow),
                Some(PourQuality::Irregular) => self.feedback.notify(FeedbackEvent::IrregularFlow),
                None => {}
            }
            self.last_quality = quality;
        }
        let warning = self.flow.capacity_warning();
        if warning && !self.capacity_warned {
            tracing::warn!(
                current_g = current,
                predicted_g = self.flow.predicted_final_g(),
                "capacity warning"
            );
            self.feedback.notify(FeedbackEvent::CapacityWarning);
        }
        self.capacity_warned = warning;

        if let Some(idx) = self.targets.update(current) {
            let done = &self.targets.progress()[idx];
            tracing::info!(
                name = %done.name,
                target_g = done.target_g,
                measured_g = done.measured_g,
                "target reached"
            );
            self.feedback.notify(FeedbackEvent::TargetReached);
        }

        self.refresh_snapshot(now);
    }

    /// Apply one command. Degenerate commands clamp or no-op; none fail.
    pub fn apply(&mut self, cmd: Command) {
        let now = self.clock.ms_since(self.epoch);
        match cmd {
            Command::Tare => {
                self.tare.tare(
                    self.pipeline.current_weight(),
                    self.pipeline.display_weight(),
                );
                self.auto_tare_suggested = false;
                self.suggestions.clear();
                tracing::debug!(depth = self.tare.depth(), offset_g = self.tare.offset(), "tare");
                self.feedback.notify(FeedbackEvent::TareCompleted);
            }
            Command::UndoTare => {
                if !self.tare.undo() {
                    tracing::debug!("undo tare on empty stack; ignored");
                }
            }
            Command::ToggleUnit => {
                self.unit = self.unit.toggled();
            }
            Command::SetCalibrationOffset(offset_g) => {
                let clamped = clamp_calibration_offset(offset_g);
                self.pipeline.set_calibration_offset(clamped);
                if let Err(e) = self.cal_store.store(clamped) {
                    tracing::warn!(error = %e, offset_g = clamped, "calibration offset not persisted");
                }
            }
            Command::LearnContainerPattern { max_weight_g } => {
                self.flow.learn_pattern(max_weight_g);
            }
            Command::SetTargets(targets) => {
                self.targets.set_targets(targets);
            }
            Command::ClearTargets => {
                self.targets.clear();
            }
            Command::SetContextWords(words) => {
                self.context_words = words;
                if self.stability.is_stable() {
                    self.refresh_suggestions(self.pipeline.display_weight());
                }
            }
        }
        self.refresh_snapshot(now);
    }

    /// Clear all session state: filter, tare stack, stability, flow window,
    /// targets. Calibration and learned container patterns survive.
    pub fn reset(&mut self) {
        let now = self.clock.ms_since(self.epoch);
        self.pipeline.reset();
        self.tare.clear();
        self.stability.reset();
        self.flow.reset();
        self.targets.clear();
        self.was_stable = false;
        self.prev_stable_g = 0.0;
        self.auto_tare_suggested = false;
        self.context_words.clear();
        self.suggestions.clear();
        self.last_quality = None;
        self.capacity_warned = false;
        self.refresh_snapshot(now);
    }

    pub fn snapshot(&self) -> ScaleSnapshot {
        self.snapshot.clone()
    }

    pub fn tick_hz(&self) -> u32 {
        self.cfg.display.tick_hz
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.cfg
    }

    pub fn calibration_offset(&self) -> f32 {
        self.pipeline.calibration_offset()
    }

    /// Handle to the engine's clock, for callers that pace work around it.
    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    /// A new stable weight has just been confirmed.
    fn on_stable_edge(&mut self, display_g: f32) {
        if display_g > self.cfg.tare.auto_new_g
            && self.prev_stable_g <= self.cfg.tare.auto_prior_g
        {
            tracing::debug!(display_g, "new container detected; suggesting tare");
            self.auto_tare_suggested = true;
        }
        self.refresh_suggestions(display_g);
        self.prev_stable_g = display_g;
    }

    /// Re-rank ingredient suggestions for a settled weight. Context is the
    /// completed target names plus any words set by command.
    fn refresh_suggestions(&mut self, display_g: f32) {
        if display_g >= self.cfg.recognizer.min_weight_g {
            let mut context = self.targets.completed_names();
            context.extend(self.context_words.iter().cloned());
            self.suggestions = self.recognizer.analyze(display_g, None, &context);
        } else {
            self.suggestions.clear();
        }
    }

    fn refresh_snapshot(&mut self, now_ms: u64) {
        let current = self.pipeline.current_weight();
        self.snapshot = ScaleSnapshot {
            at_ms: now_ms,
            current_weight_g: current,
            display_weight_g: self.pipeline.display_weight(),
            is_active: self.pipeline.is_active(),
            is_stable: self.stability.is_stable(),
            unit: self.unit,
            tare_depth: self.tare.depth(),
            running_total_g: self.tare.running_total(),
            session_total_g: self.tare.running_total() + current,
            pour_speed_g_per_s: self.flow.pour_speed(),
            pour_direction: self.flow.direction(),
            pour_quality: self.flow.quality(),
            predicted_final_weight_g: self.flow.predicted_final_g(),
            capacity_warning: self.flow.capacity_warning(),
            auto_tare_suggested: self.auto_tare_suggested,
            suggestions: self.suggestions.clone(),
            confidence: self.suggestions.first().map_or(0.0, |s| s.confidence),
            targets: self.targets.progress().to_vec(),
            active_target: self.targets.active_target().map(|t| t.name.clone()),
        };
    }
}

/// Builder for `ScaleEngine`. Everything defaults: config to the stock
/// tuning, clock to real time, persistence to in-memory, feedback to
/// nothing, ingredients to the built-in table.
#[derive(Default)]
pub struct ScaleEngineBuilder {
    cfg: Option<ScaleConfig>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    cal_store: Option<Box<dyn CalibrationStore + Send>>,
    feedback: Option<Box<dyn FeedbackSink + Send>>,
    ingredients: Option<IngredientTable>,
}

impl ScaleEngineBuilder {
    #[must_use]
    pub fn config(mut self, cfg: ScaleConfig) -> Self {
        self.cfg = Some(cfg);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn calibration_store(mut self, store: Box<dyn CalibrationStore + Send>) -> Self {
        self.cal_store = Some(store);
        self
    }

    #[must_use]
    pub fn feedback(mut self, sink: Box<dyn FeedbackSink + Send>) -> Self {
        self.feedback = Some(sink);
        self
    }

    #[must_use]
    pub fn ingredients(mut self, table: IngredientTable) -> Self {
        self.ingredients = Some(table);
        self
    }

    pub fn try_build(self) -> Result<ScaleEngine> {
        let cfg = self.cfg.unwrap_or_default();
        validate(&cfg)?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let mut cal_store = self
            .cal_store
            .unwrap_or_else(|| Box::new(MemoryCalibrationStore::default()));
        let feedback = self.feedback.unwrap_or_else(|| Box::new(NullSink));
        let table = self.ingredients.unwrap_or_else(IngredientTable::builtin);

        let offset = match cal_store.load() {
            Ok(Some(v)) => clamp_calibration_offset(v),
            Ok(None) => 0.0,
            Err(e) => {
                tracing::warn!(error = %e, "calibration load failed; starting from 0");
                0.0
            }
        };

        let mut pipeline = MeasurementPipeline::new(&cfg.filter, &cfg.display);
        pipeline.set_calibration_offset(offset);
        let epoch = clock.now();

        let mut engine = ScaleEngine {
            pipeline,
            tare: TareManager::new(&cfg.tare),
            stability: StabilityDetector::new(&cfg.stability),
            flow: FlowAnalyzer::new(&cfg.flow, &cfg.capacity),
            recognizer: IngredientRecognizer::new(table, &cfg.recognizer),
            targets: TargetTracker::new(),
            cal_store,
            feedback,
            unit: cfg.display.unit,
            was_stable: false,
            prev_stable_g: 0.0,
            auto_tare_suggested: false,
            context_words: Vec::new(),
            suggestions: Vec::new(),
            last_quality: None,
            capacity_warned: false,
            snapshot: ScaleSnapshot::default(),
            cfg,
            clock,
            epoch,
        };
        engine.refresh_snapshot(0);
        Ok(engine)
    }
}

fn validate(cfg: &ScaleConfig) -> Result<()> {
    if !cfg.filter.process_noise.is_finite() || cfg.filter.process_noise <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "process_noise must be finite and > 0",
        )));
    }
    if !cfg.filter.measurement_noise.is_finite() || cfg.filter.measurement_noise <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "measurement_noise must be finite and > 0",
        )));
    }
    if cfg.filter.history < 2 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "filter history must be >= 2",
        )));
    }
    if cfg.display.tick_hz == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick_hz must be > 0",
        )));
    }
    if !(0.0..1.0).contains(&cfg.display.smoothing_alpha) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "smoothing_alpha must be in [0.0, 1.0)",
        )));
    }
    if !cfg.stability.epsilon_g.is_finite() || cfg.stability.epsilon_g <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "stability epsilon must be > 0",
        )));
    }
    if cfg.stability.hold_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "stability hold must be >= 1 ms",
        )));
    }
    if cfg.flow.history < 2 || cfg.flow.rate_samples < 2 || cfg.flow.variance_window < 2 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "flow windows must be >= 2",
        )));
    }
    if !cfg.flow.decel_divisor.is_finite() || cfg.flow.decel_divisor <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "decel_divisor must be > 0",
        )));
    }
    if cfg.flow.pour_threshold_g_per_s.is_sign_negative()
        || cfg.flow.pattern_merge_g.is_sign_negative()
    {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "flow thresholds must be >= 0",
        )));
    }
    if cfg.tare.max_depth == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tare depth must be >= 1",
        )));
    }
    if cfg.tare.auto_new_g <= cfg.tare.auto_prior_g {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "auto-tare thresholds out of order",
        )));
    }
    if cfg.recognizer.max_suggestions == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "max_suggestions must be >= 1",
        )));
    }
    if !(0.0..=1.0).contains(&cfg.recognizer.min_confidence) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "min_confidence must be in [0.0, 1.0]",
        )));
    }
    if !cfg.capacity.max_weight_g.is_finite() || cfg.capacity.max_weight_g <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "capacity max weight must be > 0",
        )));
    }
    if cfg.capacity.warn_fill_ratio <= 0.0 || cfg.capacity.warn_fill_ratio > 1.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "warn_fill_ratio must be in (0.0, 1.0]",
        )));
    }
    Ok(())
}
