//! Sample-log loading for session replay.
//!
//! A trace is a CSV file with headers `t_ms,grams`: one row per delivered
//! batch, timestamps in milliseconds from session start, weight in grams.
//! A grams value of 0 is an empty surface.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::{ScriptedBatch, ScriptedSurface};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("trace must have headers 't_ms,grams', got '{0}'")]
    BadHeader(String),
    #[error("trace row {row}: {msg}")]
    BadRecord { row: usize, msg: String },
    #[error("trace row {row}: timestamps must not decrease")]
    NonMonotonic { row: usize },
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Load a trace file into scripted batches with inter-sample delays
/// recovered from the recorded timestamps.
pub fn load_trace(path: &Path) -> Result<Vec<ScriptedBatch>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let headers = rdr.headers()?.clone();
    let actual: Vec<&str> = headers.iter().map(str::trim).collect();
    if actual != ["t_ms", "grams"] {
        return Err(SimError::BadHeader(actual.join(",")));
    }

    let mut out = Vec::new();
    let mut prev_ms: u64 = 0;
    for (idx, rec) in rdr.records().enumerate() {
        let row = idx + 2; // header occupies row 1
        let rec = rec?;
        if rec.len() != 2 {
            return Err(SimError::BadRecord {
                row,
                msg: format!("expected 2 fields, got {}", rec.len()),
            });
        }
        let t_ms: u64 = rec[0].trim().parse().map_err(|e| SimError::BadRecord {
            row,
            msg: format!("bad t_ms '{}': {e}", &rec[0]),
        })?;
        let grams: f32 = rec[1].trim().parse().map_err(|e| SimError::BadRecord {
            row,
            msg: format!("bad grams '{}': {e}", &rec[1]),
        })?;
        if !grams.is_finite() {
            return Err(SimError::BadRecord {
                row,
                msg: format!("grams must be finite, got {grams}"),
            });
        }
        if t_ms < prev_ms {
            return Err(SimError::NonMonotonic { row });
        }
        out.push(ScriptedBatch {
            delay: Duration::from_millis(t_ms - prev_ms),
            batch: crate::weight_batch(grams),
        });
        prev_ms = t_ms;
    }
    tracing::debug!(samples = out.len(), ?path, "trace loaded");
    Ok(out)
}

/// Load a trace straight into a replayable surface. `paced` keeps the
/// recorded timing; otherwise samples are delivered back to back.
pub fn load_surface(path: &Path, paced: bool) -> Result<ScriptedSurface> {
    let mut batches = load_trace(path)?;
    if !paced {
        for b in &mut batches {
            b.delay = Duration::ZERO;
        }
    }
    Ok(ScriptedSurface::new(batches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use padscale_traits::TouchSurface;
    use std::io::Write;

    fn write_trace(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(body.as_bytes()).expect("write trace");
        f
    }

    #[test]
    fn loads_rows_and_recovers_delays() {
        let f = write_trace("t_ms,grams\n0,0.0\n16,120.5\n48,121.0\n");
        let batches = load_trace(f.path()).expect("load");
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].delay, Duration::ZERO);
        assert_eq!(batches[1].delay, Duration::from_millis(16));
        assert_eq!(batches[2].delay, Duration::from_millis(32));
        assert!((batches[1].batch.active_pressure() - 120.5).abs() < f32::EPSILON);
        assert!(!batches[0].batch.has_active_contact());
    }

    #[test]
    fn rejects_wrong_headers() {
        let f = write_trace("time,weight\n0,1.0\n");
        let err = load_trace(f.path()).expect_err("should fail");
        assert!(matches!(err, SimError::BadHeader(_)), "got {err}");
    }

    #[test]
    fn rejects_decreasing_timestamps() {
        let f = write_trace("t_ms,grams\n100,1.0\n50,2.0\n");
        let err = load_trace(f.path()).expect_err("should fail");
        assert!(matches!(err, SimError::NonMonotonic { row: 3 }), "got {err}");
    }

    #[test]
    fn reports_row_numbers_for_bad_fields() {
        let f = write_trace("t_ms,grams\n0,1.0\n16,not-a-number\n");
        let err = load_trace(f.path()).expect_err("should fail");
        assert!(matches!(err, SimError::BadRecord { row: 3, .. }), "got {err}");
    }

    #[test]
    fn unpaced_surface_drops_delays() {
        let f = write_trace("t_ms,grams\n0,10.0\n500,20.0\n");
        let mut surface = load_surface(f.path(), false).expect("load");
        assert_eq!(surface.remaining(), 2);
        let first = surface
            .next_batch(Duration::from_millis(1))
            .expect("read")
            .expect("batch");
        assert!((first.active_pressure() - 10.0).abs() < f32::EPSILON);
    }
}
