//! padscale binary: config loading, logging setup, and command dispatch.

mod cli;
mod error_fmt;
mod report;
mod session;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use padscale_core::TargetQuantity;
use padscale_core::config::RecognizerCfg;
use padscale_core::recognizer::IngredientRecognizer;
use padscale_sim::{PourProfile, PourSimulator};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::session::SessionPlan;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;
    let Cli {
        config,
        ingredients,
        calibration,
        json,
        log_level,
        cmd,
    } = cli;

    let cfg = load_config(&config)?;
    init_tracing(&log_level, json, &cfg.logging)?;
    tracing::debug!(config = %config.display(), "starting");

    let sample_timeout = Duration::from_millis(cfg.timeouts.sample_ms);

    match cmd {
        Commands::Pour {
            grams,
            container,
            rate,
            noise,
            seed,
            target,
            context,
            auto_tare,
            fast,
        } => {
            let engine =
                session::build_engine(&cfg, ingredients.as_deref(), calibration.as_deref())?;
            let profile = PourProfile {
                container_g: container,
                target_g: grams,
                rate_g_per_s: rate,
                sigma_g: noise,
                realtime: !fast,
                ..PourProfile::default()
            };
            let surface = Box::new(PourSimulator::new(profile, seed));
            let targets = target
                .map(|name| vec![TargetQuantity { name, grams }])
                .unwrap_or_default();
            let plan = SessionPlan {
                targets,
                context,
                auto_tare,
                json,
            };
            let shutdown = install_ctrlc()?;
            let summary = session::run_session(engine, surface, sample_timeout, &plan, &shutdown)?;
            emit_summary(&summary, json);
        }
        Commands::Replay { file, fast } => {
            let engine =
                session::build_engine(&cfg, ingredients.as_deref(), calibration.as_deref())?;
            let surface = Box::new(padscale_sim::trace::load_surface(&file, !fast)?);
            let plan = SessionPlan {
                targets: Vec::new(),
                context: Vec::new(),
                auto_tare: false,
                json,
            };
            let shutdown = install_ctrlc()?;
            let summary = session::run_session(engine, surface, sample_timeout, &plan, &shutdown)?;
            emit_summary(&summary, json);
        }
        Commands::Suggest {
            grams,
            density,
            context,
        } => {
            let table = session::load_table(&cfg, ingredients.as_deref())?;
            let rec_cfg = RecognizerCfg::from(&cfg.recognizer);
            let recognizer = IngredientRecognizer::new(table, &rec_cfg);
            let items = recognizer.analyze(grams, density, &context);
            if json {
                println!("{}", report::suggestions_json(&items));
            } else {
                println!("{}", report::render_suggestions(&items));
            }
        }
    }
    Ok(())
}

/// Read and validate the config TOML; a missing file is the documented
/// defaults, not an error.
fn load_config(path: &Path) -> eyre::Result<padscale_config::Config> {
    if !path.exists() {
        return Ok(padscale_config::Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = padscale_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Console logging on stderr (stdout carries session output), plus an
/// optional JSON file sink from `[logging]` in the config.
fn init_tracing(level: &str, json: bool, log_cfg: &padscale_config::Logging) -> eyre::Result<()> {
    use tracing_subscriber::layer::{Layer, SubscriberExt};
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level '{level}'"))?;

    let (console_pretty, console_json) = if json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().compact().with_writer(std::io::stderr)), None)
    };

    let file_layer = match &log_cfg.file {
        Some(file) => {
            let path = Path::new(file);
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
            let appender = match log_cfg.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let file_filter = EnvFilter::try_new(log_cfg.level.as_deref().unwrap_or("info"))
                .wrap_err("invalid logging.level in config")?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_pretty)
        .with(console_json)
        .with(file_layer)
        .init();
    Ok(())
}

fn install_ctrlc() -> eyre::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .wrap_err("install Ctrl-C handler")?;
    Ok(flag)
}

fn emit_summary(summary: &session::SessionSummary, json: bool) {
    if json {
        println!("{}", report::summary_line(summary));
    } else {
        println!("{}", report::render_summary(summary));
    }
}
