#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core measurement logic (sensor-agnostic).
//!
//! This crate turns raw touch-pressure batches into calibrated, stable,
//! annotated weight readings. All sensor interactions go through the
//! `padscale_traits::TouchSurface` trait; persistence goes through
//! `padscale_traits::CalibrationStore`.
//!
//! ## Architecture
//!
//! - **Filtering**: 1-D Kalman filter over summed contact pressure (`filter`)
//! - **Pipeline**: calibration, tare subtraction, display smoothing (`pipeline`)
//! - **Tare**: nested tare stack and session totals (`tare`)
//! - **Stability**: debounced settle detection (`stability`)
//! - **Flow**: pour rate, smoothness, overflow prediction (`flow`)
//! - **Recognition**: weight/density ingredient matching (`recognizer`)
//! - **Targets**: recipe step tracking (`targets`)
//! - **Engine**: single-writer state machine over all of the above (`engine`)
//! - **Service**: threaded engine with channels in and snapshots out (`service`)

pub mod command;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod filter;
pub mod flow;
pub mod history;
pub mod mocks;
pub mod pipeline;
pub mod recognizer;
pub mod service;
pub mod snapshot;
pub mod stability;
pub mod tare;
pub mod targets;
pub mod units;
pub mod util;

pub use command::Command;
pub use config::ScaleConfig;
pub use engine::{ScaleEngine, ScaleEngineBuilder};
pub use error::{BuildError, Report, Result, ScaleError};
pub use flow::{PourDirection, PourQuality};
pub use recognizer::{IngredientTable, MeasurementSuggestion};
pub use service::{ScaleService, SurfacePump};
pub use snapshot::ScaleSnapshot;
pub use stability::StabilityState;
pub use targets::{TargetProgress, TargetQuantity};
pub use units::WeightUnit;
