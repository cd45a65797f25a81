//! Session driving: engine assembly and snapshot streaming for pour/replay.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use padscale_config::FileCalibrationStore;
use padscale_core::mocks::MemoryCalibrationStore;
use padscale_core::{
    Command, IngredientTable, ScaleConfig, ScaleEngine, ScaleService, TargetQuantity, WeightUnit,
};
use padscale_traits::{FeedbackEvent, FeedbackSink, TouchSurface};

use crate::report;

/// Poll cadence for the status loop; decoupled from the engine tick rate.
const POLL: Duration = Duration::from_millis(50);
/// How long to wait for the display to settle after the sample stream ends.
const DONE_GRACE: Duration = Duration::from_secs(5);

/// Routes engine feedback cues into the log stream instead of a buzzer.
struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn notify(&mut self, event: FeedbackEvent) {
        match event {
            FeedbackEvent::GoodFlow => tracing::info!("cue: steady pour"),
            FeedbackEvent::IrregularFlow => tracing::info!("cue: uneven pour"),
            FeedbackEvent::CapacityWarning => tracing::warn!("cue: container nearly full"),
            FeedbackEvent::TareCompleted => tracing::info!("cue: tared"),
            FeedbackEvent::TargetReached => tracing::info!("cue: target reached"),
        }
    }
}

/// What the session loop should do beyond displaying weight.
pub struct SessionPlan {
    pub targets: Vec<TargetQuantity>,
    /// Recipe words handed to the recognizer alongside completed targets.
    pub context: Vec<String>,
    pub auto_tare: bool,
    pub json: bool,
}

/// Where the session ended up, for the final report.
pub struct SessionSummary {
    /// Settled display weight; `None` when the run was interrupted.
    pub final_g: Option<f32>,
    pub unit: WeightUnit,
    pub running_total_g: f32,
    pub session_total_g: f32,
    pub tare_depth: usize,
    pub duration_ms: u64,
    pub suggestion: Option<(String, f32)>,
    pub targets_completed: usize,
    pub targets_total: usize,
    pub capacity_warning: bool,
    pub interrupted: bool,
}

/// Resolve the ingredient table: explicit CLI path first, then the config's
/// `[recognizer] ingredients` path, then the built-in table.
pub fn load_table(
    cfg: &padscale_config::Config,
    flag: Option<&Path>,
) -> eyre::Result<IngredientTable> {
    let path = flag
        .map(Path::to_path_buf)
        .or_else(|| cfg.recognizer.ingredients.as_ref().map(std::path::PathBuf::from));
    match path {
        Some(p) => {
            let rows = padscale_config::load_ingredient_csv(&p)?;
            Ok(IngredientTable::from(rows.as_slice()))
        }
        None => Ok(IngredientTable::builtin()),
    }
}

/// Assemble an engine from config plus optional ingredient and calibration
/// files. A persisted calibration in the TOML is used when no separate
/// calibration file is given.
pub fn build_engine(
    cfg: &padscale_config::Config,
    ingredients: Option<&Path>,
    calibration: Option<&Path>,
) -> eyre::Result<ScaleEngine> {
    let mut builder = ScaleEngine::builder()
        .config(ScaleConfig::from(cfg))
        .ingredients(load_table(cfg, ingredients)?);

    if let Some(path) = calibration {
        builder = builder.calibration_store(Box::new(FileCalibrationStore::new(path)));
    } else if let Some(cal) = cfg.calibration {
        builder =
            builder.calibration_store(Box::new(MemoryCalibrationStore::new(Some(cal.offset_g))));
    }

    builder.feedback(Box::new(LogFeedback)).try_build()
}

/// Drive one session to completion: spawn the service, stream status until
/// the surface ends (or Ctrl-C), and collect the final numbers.
pub fn run_session(
    engine: ScaleEngine,
    surface: Box<dyn TouchSurface + Send>,
    sample_timeout: Duration,
    plan: &SessionPlan,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<SessionSummary> {
    let started = Instant::now();
    let service = ScaleService::spawn(engine, surface, sample_timeout);
    if !plan.targets.is_empty() {
        service.send(Command::SetTargets(plan.targets.clone()))?;
    }
    if !plan.context.is_empty() {
        service.send(Command::SetContextWords(plan.context.clone()))?;
    }

    let mut tared = false;
    let mut interrupted = false;
    let mut saw_warning = false;
    let mut done_since: Option<Instant> = None;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            interrupted = true;
            break;
        }
        let snap = service.snapshot();
        saw_warning |= snap.capacity_warning;

        if plan.auto_tare && snap.auto_tare_suggested && !tared {
            match service.send(Command::Tare) {
                Ok(()) => tared = true,
                Err(e) => tracing::warn!(error = %e, "tare command not queued"),
            }
        }

        if plan.json {
            println!("{}", report::snapshot_line(&snap));
        } else {
            print!("\r{}", report::render_status(&snap));
            let _ = std::io::stdout().flush();
        }

        if service.surface_done() {
            let since = *done_since.get_or_insert_with(Instant::now);
            if snap.is_stable || since.elapsed() > DONE_GRACE {
                break;
            }
        }

        std::thread::sleep(POLL);
    }

    let snap = service.snapshot();
    drop(service);
    if !plan.json {
        println!();
    }

    Ok(SessionSummary {
        final_g: if interrupted { None } else { Some(snap.display_weight_g) },
        unit: snap.unit,
        running_total_g: snap.running_total_g,
        session_total_g: snap.session_total_g,
        tare_depth: snap.tare_depth,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        suggestion: snap.suggestions.first().map(|s| (s.name.clone(), s.confidence)),
        targets_completed: snap.targets.iter().filter(|t| t.completed).count(),
        targets_total: snap.targets.len(),
        capacity_warning: saw_warning,
        interrupted,
    })
}
