//! Human-readable error descriptions and structured JSON error formatting.

use padscale_core::{BuildError, ScaleError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<ScaleError>() {
        return match se {
            ScaleError::Sensor(msg) => format!(
                "What happened: The touch surface failed ({msg}).\nLikely causes: The simulated surface ended unexpectedly or a replay file was truncated.\nHow to fix: Check the trace file, or rerun with --log-level=debug for details."
            ),
            ScaleError::Calibration(msg) => format!(
                "What happened: Calibration persistence failed ({msg}).\nLikely causes: The calibration file is unreadable or its directory is not writable.\nHow to fix: Check the --calibration path and file permissions."
            ),
            ScaleError::State(msg) => format!(
                "What happened: The engine refused a command ({msg}).\nLikely causes: The engine loop already stopped or its queue is saturated.\nHow to fix: Rerun; if it persists, rerun with --log-level=debug and check the logs."
            ),
        };
    }

    // String-based heuristics for errors coming from loaders
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("ingredient csv must have headers") {
        return "Invalid headers in ingredient CSV. Expected 'name,typical_weight,density,category,followed_by'.".to_string();
    }

    if lower.contains("trace must have headers") {
        return "Invalid headers in trace CSV. Expected 't_ms,grams'.".to_string();
    }

    if lower.contains("must be")
        && (lower.contains('[') || lower.contains(">=") || lower.contains("> "))
    {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: {msg}.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if err.downcast_ref::<BuildError>().is_some() {
        "InvalidConfig"
    } else if let Some(se) = err.downcast_ref::<ScaleError>() {
        match se {
            ScaleError::Sensor(_) => "Sensor",
            ScaleError::Calibration(_) => "Calibration",
            ScaleError::State(_) => "State",
        }
    } else {
        "Error"
    };

    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
