use thiserror::Error;

/// Runtime errors surfaced by the scale service.
#[derive(Debug, Error, Clone)]
pub enum ScaleError {
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("calibration persistence error: {0}")]
    Calibration(String),
    #[error("invalid state: {0}")]
    State(String),
}

/// Errors from `ScaleEngineBuilder::try_build`.
#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
