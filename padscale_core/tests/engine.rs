//! End-to-end engine scenarios on a virtual clock: settle, tare, undo,
//! auto-tare suggestion, unit toggle, calibration, targets.

use std::sync::Arc;

use padscale_core::command::Command;
use padscale_core::mocks::{FailingCalibrationStore, MemoryCalibrationStore, RecordingSink};
use padscale_core::{ScaleEngine, TargetQuantity, WeightUnit};
use padscale_traits::clock::test_clock::TestClock;
use padscale_traits::{FeedbackEvent, TouchBatch, TouchContact};

fn batch(pressures: &[f32]) -> TouchBatch {
    let contacts = pressures
        .iter()
        .enumerate()
        .map(|(i, &p)| TouchContact {
            contact_id: i as u32,
            pressure: p,
            active: true,
        })
        .collect();
    TouchBatch::new(contacts)
}

fn engine_with_clock(clock: &TestClock) -> ScaleEngine {
    ScaleEngine::builder()
        .clock(Arc::new(clock.clone()))
        .try_build()
        .expect("engine builds with defaults")
}

/// Hold a constant load long enough for the filter, the display smoother,
/// and the stability debounce to all settle.
fn settle(engine: &mut ScaleEngine, clock: &TestClock, grams: f32) {
    for _ in 0..200 {
        engine.ingest(&batch(&[grams]));
        clock.advance_ms(16);
        engine.tick();
    }
}

#[test]
fn constant_load_converges_and_stabilizes() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    settle(&mut engine, &clock, 300.0);

    let snap = engine.snapshot();
    assert!(snap.is_active);
    assert!(snap.is_stable, "expected stability after a long hold");
    assert!(
        (snap.current_weight_g - 300.0).abs() < 0.5,
        "current={}",
        snap.current_weight_g
    );
    assert!(
        (snap.display_weight_g - 300.0).abs() < 1.0,
        "display={}",
        snap.display_weight_g
    );
}

#[test]
fn lifting_everything_reads_zero_and_inactive() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    settle(&mut engine, &clock, 150.0);
    for _ in 0..200 {
        engine.ingest(&TouchBatch::default());
        clock.advance_ms(16);
        engine.tick();
    }

    let snap = engine.snapshot();
    assert!(!snap.is_active);
    assert!(snap.current_weight_g.abs() < f32::EPSILON);
    assert!(snap.display_weight_g < 1.0, "display={}", snap.display_weight_g);
}

#[test]
fn multi_contact_pressure_is_summed() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    for _ in 0..200 {
        engine.ingest(&batch(&[120.0, 60.0, 20.0]));
        clock.advance_ms(16);
        engine.tick();
    }

    let snap = engine.snapshot();
    assert!(
        (snap.current_weight_g - 200.0).abs() < 0.5,
        "current={}",
        snap.current_weight_g
    );
}

#[test]
fn tare_zeroes_and_undo_restores() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    settle(&mut engine, &clock, 300.0);
    engine.apply(Command::Tare);

    settle(&mut engine, &clock, 300.0);
    let snap = engine.snapshot();
    assert_eq!(snap.tare_depth, 1);
    assert!(snap.current_weight_g < 0.5, "current={}", snap.current_weight_g);
    assert!(
        (snap.running_total_g - 300.0).abs() < 1.0,
        "running_total={}",
        snap.running_total_g
    );
    assert!(
        (snap.session_total_g - 300.0).abs() < 1.5,
        "session_total={}",
        snap.session_total_g
    );

    engine.apply(Command::UndoTare);
    settle(&mut engine, &clock, 300.0);
    let snap = engine.snapshot();
    assert_eq!(snap.tare_depth, 0);
    assert!(snap.running_total_g.abs() < 0.01, "running_total={}", snap.running_total_g);
    assert!(
        (snap.current_weight_g - 300.0).abs() < 0.5,
        "current={}",
        snap.current_weight_g
    );
}

#[test]
fn nested_tares_accumulate_offsets() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    // Bowl on, tare, flour in, tare, butter in.
    settle(&mut engine, &clock, 100.0);
    engine.apply(Command::Tare);
    settle(&mut engine, &clock, 250.0);
    let snap = engine.snapshot();
    assert!(
        (snap.current_weight_g - 150.0).abs() < 0.5,
        "after first tare current={}",
        snap.current_weight_g
    );

    engine.apply(Command::Tare);
    settle(&mut engine, &clock, 400.0);
    let snap = engine.snapshot();
    assert_eq!(snap.tare_depth, 2);
    assert!(
        (snap.current_weight_g - 150.0).abs() < 0.5,
        "after second tare current={}",
        snap.current_weight_g
    );
    assert!(
        (snap.running_total_g - 250.0).abs() < 1.5,
        "running_total={}",
        snap.running_total_g
    );

    // Undo the second tare: offset falls back to the bowl-only level.
    engine.apply(Command::UndoTare);
    settle(&mut engine, &clock, 400.0);
    let snap = engine.snapshot();
    assert_eq!(snap.tare_depth, 1);
    assert!(
        (snap.current_weight_g - 300.0).abs() < 0.5,
        "after undo current={}",
        snap.current_weight_g
    );
    assert!(
        (snap.running_total_g - 100.0).abs() < 1.0,
        "running_total={}",
        snap.running_total_g
    );
}

#[test]
fn undo_on_empty_stack_is_ignored() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    engine.apply(Command::UndoTare);
    let snap = engine.snapshot();
    assert_eq!(snap.tare_depth, 0);
    assert!(snap.running_total_g.abs() < f32::EPSILON);
}

#[test]
fn auto_tare_suggested_for_new_container_only() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    // A fresh container on an empty surface triggers the suggestion.
    settle(&mut engine, &clock, 300.0);
    assert!(engine.snapshot().auto_tare_suggested);

    // Taring clears it.
    engine.apply(Command::Tare);
    assert!(!engine.snapshot().auto_tare_suggested);

    // Back to empty, then a small item: below the container threshold,
    // no suggestion.
    engine.apply(Command::UndoTare);
    settle(&mut engine, &clock, 0.0);
    settle(&mut engine, &clock, 30.0);
    assert!(!engine.snapshot().auto_tare_suggested);

    // Growing an existing load does not look like a new container.
    settle(&mut engine, &clock, 90.0);
    assert!(!engine.snapshot().auto_tare_suggested);
}

#[test]
fn unit_toggle_round_trips() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    assert_eq!(engine.snapshot().unit, WeightUnit::Grams);
    engine.apply(Command::ToggleUnit);
    assert_eq!(engine.snapshot().unit, WeightUnit::Ounces);
    engine.apply(Command::ToggleUnit);
    assert_eq!(engine.snapshot().unit, WeightUnit::Grams);
}

#[test]
fn stored_calibration_offset_is_loaded_and_applied() {
    let clock = TestClock::new();
    let mut engine = ScaleEngine::builder()
        .clock(Arc::new(clock.clone()))
        .calibration_store(Box::new(MemoryCalibrationStore::new(Some(2.0))))
        .try_build()
        .expect("engine builds");

    assert!((engine.calibration_offset() - 2.0).abs() < f32::EPSILON);

    // Raw 100 g plus the +2 g offset converges to 102 g.
    settle(&mut engine, &clock, 100.0);
    let snap = engine.snapshot();
    assert!(
        (snap.current_weight_g - 102.0).abs() < 0.5,
        "current={}",
        snap.current_weight_g
    );
}

#[test]
fn set_calibration_offset_clamps_to_sane_range() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    engine.apply(Command::SetCalibrationOffset(40.0));
    assert!((engine.calibration_offset() - 5.0).abs() < f32::EPSILON);

    engine.apply(Command::SetCalibrationOffset(-40.0));
    assert!((engine.calibration_offset() + 5.0).abs() < f32::EPSILON);

    engine.apply(Command::SetCalibrationOffset(-1.5));
    assert!((engine.calibration_offset() + 1.5).abs() < f32::EPSILON);

    engine.apply(Command::SetCalibrationOffset(f32::NAN));
    assert!(engine.calibration_offset().abs() < f32::EPSILON);
}

#[test]
fn failing_calibration_store_falls_back_to_zero() {
    let clock = TestClock::new();
    let engine = ScaleEngine::builder()
        .clock(Arc::new(clock.clone()))
        .calibration_store(Box::new(FailingCalibrationStore))
        .try_build()
        .expect("engine builds despite broken persistence");

    assert!(engine.calibration_offset().abs() < f32::EPSILON);
}

#[test]
fn targets_complete_in_order_with_feedback() {
    let clock = TestClock::new();
    let sink = RecordingSink::new();
    let mut engine = ScaleEngine::builder()
        .clock(Arc::new(clock.clone()))
        .feedback(Box::new(sink.clone()))
        .try_build()
        .expect("engine builds");

    engine.apply(Command::SetTargets(vec![
        TargetQuantity {
            name: "flour".into(),
            grams: 200.0,
        },
        TargetQuantity {
            name: "sugar".into(),
            grams: 150.0,
        },
    ]));
    assert_eq!(engine.snapshot().active_target.as_deref(), Some("flour"));

    // Pour flour to 200 g.
    settle(&mut engine, &clock, 200.0);
    let snap = engine.snapshot();
    assert!(snap.targets[0].completed, "flour should be done");
    assert!(!snap.targets[1].completed);
    assert_eq!(snap.active_target.as_deref(), Some("sugar"));

    // Tare the flour away, pour sugar to 150 g net.
    engine.apply(Command::Tare);
    settle(&mut engine, &clock, 350.0);
    let snap = engine.snapshot();
    assert!(snap.targets[1].completed, "sugar should be done");
    assert_eq!(snap.active_target, None);

    let events = sink.take();
    let reached = events
        .iter()
        .filter(|e| **e == FeedbackEvent::TargetReached)
        .count();
    assert_eq!(reached, 2, "events: {events:?}");
    assert!(events.contains(&FeedbackEvent::TareCompleted));
}

#[test]
fn completed_target_stays_completed_when_weight_drops() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    engine.apply(Command::SetTargets(vec![TargetQuantity {
        name: "butter".into(),
        grams: 100.0,
    }]));
    settle(&mut engine, &clock, 100.0);
    assert!(engine.snapshot().targets[0].completed);

    settle(&mut engine, &clock, 0.0);
    let snap = engine.snapshot();
    assert!(snap.targets[0].completed, "completion must latch");
    assert!((snap.targets[0].measured_g - 100.0).abs() < 3.0);
}

#[test]
fn clear_targets_empties_progress() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    engine.apply(Command::SetTargets(vec![TargetQuantity {
        name: "milk".into(),
        grams: 120.0,
    }]));
    engine.apply(Command::ClearTargets);
    let snap = engine.snapshot();
    assert!(snap.targets.is_empty());
    assert_eq!(snap.active_target, None);
}

#[test]
fn reset_clears_session_but_keeps_calibration() {
    let clock = TestClock::new();
    let mut engine = ScaleEngine::builder()
        .clock(Arc::new(clock.clone()))
        .calibration_store(Box::new(MemoryCalibrationStore::new(Some(1.0))))
        .try_build()
        .expect("engine builds");

    settle(&mut engine, &clock, 100.0);
    engine.apply(Command::Tare);
    engine.reset();

    let snap = engine.snapshot();
    assert_eq!(snap.tare_depth, 0);
    assert!(snap.running_total_g.abs() < f32::EPSILON);
    assert!(snap.current_weight_g.abs() < f32::EPSILON);
    assert!(!snap.is_stable);
    assert!((engine.calibration_offset() - 1.0).abs() < f32::EPSILON);
}

#[test]
fn stable_weight_yields_ingredient_suggestions() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    // 120 g is the canonical cup of flour in the built-in table.
    settle(&mut engine, &clock, 120.0);
    let snap = engine.snapshot();
    assert!(snap.is_stable);
    assert_eq!(
        snap.suggestions.first().map(|s| s.name.as_str()),
        Some("flour"),
        "suggestions: {:?}",
        snap.suggestions
    );
    assert!(snap.confidence > 0.9, "confidence={}", snap.confidence);
}

#[test]
fn context_words_rerank_suggestions_while_stable() {
    let clock = TestClock::new();
    let mut engine = engine_with_clock(&clock);

    // 55 g alone matches nothing well enough to keep.
    settle(&mut engine, &clock, 55.0);
    assert!(engine.snapshot().suggestions.is_empty());

    // Recipe context arriving mid-session pulls eggs in by rule.
    engine.apply(Command::SetContextWords(vec!["flour".into()]));
    let snap = engine.snapshot();
    assert_eq!(
        snap.suggestions.first().map(|s| s.name.as_str()),
        Some("eggs"),
        "suggestions: {:?}",
        snap.suggestions
    );
    assert!((snap.confidence - 0.7).abs() < 1e-6);
}
