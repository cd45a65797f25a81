//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "padscale", version, about = "Touch-surface scale CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/padscale.toml")]
    pub config: PathBuf,

    /// Optional ingredient table CSV (strict header)
    #[arg(long, value_name = "FILE")]
    pub ingredients: Option<PathBuf>,

    /// Optional calibration file (TOML with a single offset_g field)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Emit JSON lines on stdout instead of human-readable text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a simulated pour session against the live engine
    Pour {
        /// Net grams to pour after the container is placed
        #[arg(long, default_value_t = 250.0)]
        grams: f32,
        /// Container weight placed before the pour
        #[arg(long, value_name = "GRAMS", default_value_t = 150.0)]
        container: f32,
        /// Pour rate in grams per second
        #[arg(long, value_name = "GPS", default_value_t = 8.0)]
        rate: f32,
        /// Sensor noise sigma in grams
        #[arg(long, value_name = "GRAMS", default_value_t = 0.15)]
        noise: f32,
        /// Simulator seed
        #[arg(long, default_value_t = 1)]
        seed: u32,
        /// Track this named target for the poured amount
        #[arg(long, value_name = "NAME")]
        target: Option<String>,
        /// Recipe word that biases ingredient recognition (repeatable)
        #[arg(long = "context", value_name = "WORD")]
        context: Vec<String>,
        /// Tare as soon as the engine suggests a fresh container was placed
        #[arg(long, action = ArgAction::SetTrue)]
        auto_tare: bool,
        /// Feed the session as fast as possible instead of real time
        #[arg(long, action = ArgAction::SetTrue)]
        fast: bool,
    },
    /// Replay a recorded sample log through the engine
    Replay {
        /// CSV sample log with headers 't_ms,grams'
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Ignore recorded timing and feed samples as fast as possible
        #[arg(long, action = ArgAction::SetTrue)]
        fast: bool,
    },
    /// Rank ingredient candidates for one stable weight
    Suggest {
        /// Measured weight in grams
        #[arg(long)]
        grams: f32,
        /// Known density in g/ml, if the volume is also known
        #[arg(long)]
        density: Option<f32>,
        /// Ingredient already measured this session (repeatable)
        #[arg(long = "context", value_name = "NAME")]
        context: Vec<String>,
    },
}
