#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed ingredient tables must come back as errors, never panics.
    // This covers header checks, field parsing and the semantic row checks.
    let _ = padscale_config::parse_ingredient_csv(data);
});
