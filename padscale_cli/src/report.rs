//! Output rendering: live status lines, JSONL records, and session summaries.

use padscale_core::snapshot::ScaleSnapshot;
use padscale_core::units::format_weight;
use padscale_core::{MeasurementSuggestion, PourDirection, PourQuality};
use serde_json::{Value, json};

use crate::session::SessionSummary;

/// Round a gram/ratio value for JSON output.
fn g2(x: f32) -> f64 {
    (f64::from(x) * 100.0).round() / 100.0
}

fn unix_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

/// One live status line, fixed width so `\r` overwrites cleanly.
pub fn render_status(snap: &ScaleSnapshot) -> String {
    let weight = format_weight(snap.display_weight_g, snap.unit);
    let state = if snap.is_stable {
        "stable"
    } else if snap.is_active {
        " ...  "
    } else {
        "empty "
    };
    let mut line = format!("{weight:>10}  [{state}]");

    match snap.pour_direction {
        PourDirection::In => {
            line.push_str(&format!(
                "  pouring in {:.1} g/s, heading for {:.0} g",
                snap.pour_speed_g_per_s, snap.predicted_final_weight_g
            ));
        }
        PourDirection::Out => {
            line.push_str(&format!("  removing {:.1} g/s", snap.pour_speed_g_per_s.abs()));
        }
        PourDirection::None => {}
    }
    if snap.capacity_warning {
        line.push_str("  CONTAINER NEARLY FULL");
    }
    if snap.auto_tare_suggested {
        line.push_str("  new container? (tare suggested)");
    }
    if let Some(s) = snap.suggestions.first() {
        line.push_str(&format!("  {} {:.0}%", s.name, s.confidence * 100.0));
    }
    if let Some(name) = &snap.active_target {
        line.push_str(&format!("  target: {name}"));
    }
    format!("{line:<100}")
}

/// Periodic JSONL record for a live session.
pub fn snapshot_line(snap: &ScaleSnapshot) -> Value {
    json!({
        "at_ms": snap.at_ms,
        "weight_g": g2(snap.display_weight_g),
        "raw_g": g2(snap.current_weight_g),
        "unit": snap.unit.label(),
        "active": snap.is_active,
        "stable": snap.is_stable,
        "tare_depth": snap.tare_depth,
        "running_total_g": g2(snap.running_total_g),
        "session_total_g": g2(snap.session_total_g),
        "pour": match snap.pour_direction {
            PourDirection::In => json!("in"),
            PourDirection::Out => json!("out"),
            PourDirection::None => Value::Null,
        },
        "pour_g_per_s": g2(snap.pour_speed_g_per_s),
        "pour_quality": match snap.pour_quality {
            Some(PourQuality::Smooth) => json!("smooth"),
            Some(PourQuality::Irregular) => json!("irregular"),
            None => Value::Null,
        },
        "predicted_g": g2(snap.predicted_final_weight_g),
        "capacity_warning": snap.capacity_warning,
        "auto_tare_suggested": snap.auto_tare_suggested,
        "suggestion": snap.suggestions.first().map(|s| s.name.clone()),
        "confidence": g2(snap.confidence),
    })
}

/// Final JSONL record for a session; `final_g` is null when interrupted.
pub fn summary_line(sum: &SessionSummary) -> Value {
    json!({
        "timestamp": unix_ms(),
        "final_g": sum.final_g.map(g2),
        "unit": sum.unit.label(),
        "running_total_g": g2(sum.running_total_g),
        "session_total_g": g2(sum.session_total_g),
        "tare_depth": sum.tare_depth,
        "duration_ms": sum.duration_ms,
        "suggestion": sum.suggestion.as_ref().map(|(name, _)| name.clone()),
        "confidence": sum.suggestion.as_ref().map(|(_, c)| g2(*c)),
        "targets_completed": sum.targets_completed,
        "targets_total": sum.targets_total,
        "capacity_warning": sum.capacity_warning,
        "interrupted": sum.interrupted,
    })
}

/// Human-readable session summary.
pub fn render_summary(sum: &SessionSummary) -> String {
    let mut out = String::new();
    match sum.final_g {
        Some(g) => {
            out.push_str(&format!("Session complete: {}", format_weight(g, sum.unit)));
        }
        None => out.push_str("Session interrupted"),
    }
    out.push_str(&format!(
        "\n  running total: {}   session total: {}   tares: {}",
        format_weight(sum.running_total_g, sum.unit),
        format_weight(sum.session_total_g, sum.unit),
        sum.tare_depth
    ));
    out.push_str(&format!("\n  duration: {:.1} s", sum.duration_ms as f64 / 1000.0));
    if let Some((name, conf)) = &sum.suggestion {
        out.push_str(&format!("\n  looks like: {} ({:.0}%)", name, conf * 100.0));
    }
    if sum.targets_total > 0 {
        out.push_str(&format!(
            "\n  targets: {}/{} complete",
            sum.targets_completed, sum.targets_total
        ));
    }
    if sum.capacity_warning {
        out.push_str("\n  warning: container capacity was nearly exceeded");
    }
    out
}

/// JSON array of ranked suggestions for the one-shot query.
pub fn suggestions_json(items: &[MeasurementSuggestion]) -> Value {
    Value::Array(
        items
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "confidence": g2(s.confidence),
                    "reason": s.reason,
                    "next_likely": s.next_likely,
                })
            })
            .collect(),
    )
}

/// Text table of ranked suggestions.
pub fn render_suggestions(items: &[MeasurementSuggestion]) -> String {
    if items.is_empty() {
        return "No ingredient match for that weight.".to_string();
    }
    items
        .iter()
        .map(|s| {
            let next = if s.next_likely.is_empty() {
                String::new()
            } else {
                format!("   next: {}", s.next_likely.join(", "))
            };
            format!("{:<16} {:>3.0}%   {}{}", s.name, s.confidence * 100.0, s.reason, next)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
