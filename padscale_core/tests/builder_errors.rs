use padscale_core::error::BuildError;
use padscale_core::{ScaleConfig, ScaleEngine};
use rstest::rstest;

fn expect_invalid(cfg: ScaleConfig, needle: &str) {
    let err = ScaleEngine::builder()
        .config(cfg)
        .try_build()
        .expect_err("config should be rejected");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} missing {needle:?}");
        }
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
fn default_config_builds() {
    ScaleEngine::builder()
        .try_build()
        .expect("defaults are valid");
}

#[rstest]
fn zero_tick_hz_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.display.tick_hz = 0;
    expect_invalid(cfg, "tick_hz");
}

#[rstest]
fn smoothing_alpha_of_one_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.display.smoothing_alpha = 1.0;
    expect_invalid(cfg, "smoothing_alpha");
}

#[rstest]
fn non_positive_noise_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.filter.process_noise = 0.0;
    expect_invalid(cfg, "process_noise");

    let mut cfg = ScaleConfig::default();
    cfg.filter.measurement_noise = -0.1;
    expect_invalid(cfg, "measurement_noise");
}

#[rstest]
fn nan_noise_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.filter.process_noise = f32::NAN;
    expect_invalid(cfg, "process_noise");
}

#[rstest]
fn zero_stability_hold_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.stability.hold_ms = 0;
    expect_invalid(cfg, "hold");
}

#[rstest]
fn zero_tare_depth_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.tare.max_depth = 0;
    expect_invalid(cfg, "tare depth");
}

#[rstest]
fn inverted_auto_tare_band_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.tare.auto_new_g = 4.0;
    cfg.tare.auto_prior_g = 5.0;
    expect_invalid(cfg, "auto-tare");
}

#[rstest]
#[case::rate_samples(1, 9)]
#[case::variance_window(3, 1)]
fn undersized_flow_windows_are_rejected(
    #[case] rate_samples: usize,
    #[case] variance_window: usize,
) {
    let mut cfg = ScaleConfig::default();
    cfg.flow.rate_samples = rate_samples;
    cfg.flow.variance_window = variance_window;
    expect_invalid(cfg, "flow windows");
}

#[rstest]
fn zero_decel_divisor_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.flow.decel_divisor = 0.0;
    expect_invalid(cfg, "decel_divisor");
}

#[rstest]
fn out_of_range_min_confidence_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.recognizer.min_confidence = 1.5;
    expect_invalid(cfg, "min_confidence");
}

#[rstest]
fn zero_capacity_is_rejected() {
    let mut cfg = ScaleConfig::default();
    cfg.capacity.max_weight_g = 0.0;
    expect_invalid(cfg, "capacity");
}
