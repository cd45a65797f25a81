//! Pour detection through the full engine: direction, speed, smoothness,
//! prediction, and capacity warnings against learned containers.

use std::sync::Arc;

use padscale_core::command::Command;
use padscale_core::mocks::RecordingSink;
use padscale_core::{PourDirection, PourQuality, ScaleEngine};
use padscale_traits::clock::test_clock::TestClock;
use padscale_traits::{FeedbackEvent, TouchBatch, TouchContact};

fn batch(pressure: f32) -> TouchBatch {
    TouchBatch::new(vec![TouchContact {
        contact_id: 0,
        pressure,
        active: true,
    }])
}

fn engine_with(clock: &TestClock, sink: &RecordingSink) -> ScaleEngine {
    ScaleEngine::builder()
        .clock(Arc::new(clock.clone()))
        .feedback(Box::new(sink.clone()))
        .try_build()
        .expect("engine builds")
}

/// Drive a linear weight ramp at one ingest+tick per 16 ms.
fn ramp(engine: &mut ScaleEngine, clock: &TestClock, from_g: f32, to_g: f32, seconds: f32) {
    let ticks = (seconds / 0.016) as usize;
    for i in 0..=ticks {
        let w = from_g + (to_g - from_g) * (i as f32 / ticks as f32);
        engine.ingest(&batch(w));
        clock.advance_ms(16);
        engine.tick();
    }
}

fn hold(engine: &mut ScaleEngine, clock: &TestClock, grams: f32) {
    for _ in 0..200 {
        engine.ingest(&batch(grams));
        clock.advance_ms(16);
        engine.tick();
    }
}

#[test]
fn steady_ramp_up_reads_as_smooth_pour_in() {
    let clock = TestClock::new();
    let sink = RecordingSink::new();
    let mut engine = engine_with(&clock, &sink);

    // 8 g/s for 5 s.
    ramp(&mut engine, &clock, 0.0, 40.0, 5.0);

    let snap = engine.snapshot();
    assert_eq!(snap.pour_direction, PourDirection::In);
    assert!(
        snap.pour_speed_g_per_s > 4.0 && snap.pour_speed_g_per_s < 12.0,
        "speed={}",
        snap.pour_speed_g_per_s
    );
    assert_eq!(snap.pour_quality, Some(PourQuality::Smooth));
    assert!(
        sink.take().contains(&FeedbackEvent::GoodFlow),
        "expected a good-flow cue"
    );
}

#[test]
fn steady_ramp_down_reads_as_pour_out() {
    let clock = TestClock::new();
    let sink = RecordingSink::new();
    let mut engine = engine_with(&clock, &sink);

    hold(&mut engine, &clock, 40.0);
    ramp(&mut engine, &clock, 40.0, 0.0, 5.0);

    let snap = engine.snapshot();
    assert_eq!(snap.pour_direction, PourDirection::Out);
    assert!(snap.pour_speed_g_per_s > 4.0, "speed={}", snap.pour_speed_g_per_s);
}

#[test]
fn constant_weight_is_not_a_pour() {
    let clock = TestClock::new();
    let sink = RecordingSink::new();
    let mut engine = engine_with(&clock, &sink);

    hold(&mut engine, &clock, 100.0);

    let snap = engine.snapshot();
    assert_eq!(snap.pour_direction, PourDirection::None);
    assert!(snap.pour_speed_g_per_s < 2.0, "speed={}", snap.pour_speed_g_per_s);
    assert_eq!(snap.pour_quality, None);
    assert!(snap.predicted_final_weight_g.abs() < f32::EPSILON);
    assert!(!snap.capacity_warning);
}

#[test]
fn prediction_projects_beyond_current_weight_while_pouring() {
    let clock = TestClock::new();
    let sink = RecordingSink::new();
    let mut engine = engine_with(&clock, &sink);

    ramp(&mut engine, &clock, 0.0, 40.0, 5.0);

    let snap = engine.snapshot();
    assert!(
        snap.predicted_final_weight_g > snap.current_weight_g + 10.0,
        "predicted={} current={}",
        snap.predicted_final_weight_g,
        snap.current_weight_g
    );
    assert!(
        snap.predicted_final_weight_g < snap.current_weight_g + 100.0,
        "predicted={} current={}",
        snap.predicted_final_weight_g,
        snap.current_weight_g
    );
}

#[test]
fn erratic_pour_reads_as_irregular() {
    let clock = TestClock::new();
    let sink = RecordingSink::new();
    let mut engine = engine_with(&clock, &sink);

    // Alternate fast spurts and pauses, ending mid-spurt; the rate spread
    // across the variance window stays wide the whole time.
    let mut w = 0.0;
    for i in 0..392 {
        if (i / 8) % 2 == 0 {
            w += 0.30; // ~19 g/s burst
        }
        engine.ingest(&batch(w));
        clock.advance_ms(16);
        engine.tick();
    }

    let snap = engine.snapshot();
    assert_eq!(snap.pour_quality, Some(PourQuality::Irregular), "snap: {snap:?}");
    assert!(
        sink.take().contains(&FeedbackEvent::IrregularFlow),
        "expected an irregular-flow cue"
    );
}

#[test]
fn capacity_warning_fires_against_learned_container() {
    let clock = TestClock::new();
    let sink = RecordingSink::new();
    let mut engine = engine_with(&clock, &sink);

    engine.apply(Command::LearnContainerPattern { max_weight_g: 100.0 });

    // Pour toward the learned 100 g limit at 5 g/s; past 90 g the projected
    // final weight overshoots the container.
    ramp(&mut engine, &clock, 0.0, 95.0, 19.0);

    let snap = engine.snapshot();
    assert!(snap.capacity_warning, "snap: {snap:?}");
    assert!(
        sink.take().contains(&FeedbackEvent::CapacityWarning),
        "expected a capacity cue"
    );
}

#[test]
fn no_capacity_warning_without_matching_container() {
    let clock = TestClock::new();
    let sink = RecordingSink::new();
    let mut engine = engine_with(&clock, &sink);

    // Same pour, no learned container; the surface's own 5 kg limit is far.
    ramp(&mut engine, &clock, 0.0, 95.0, 19.0);

    assert!(!engine.snapshot().capacity_warning);
    assert!(!sink.take().contains(&FeedbackEvent::CapacityWarning));
}
