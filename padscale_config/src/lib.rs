#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and ingredient table parsing for the scale.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every field has a default, so an empty config file is a working scale.
//! - Ingredient CSV loader enforces headers and cross-checks pairing
//!   references so typos surface at load time instead of mid-session.
//! - `FileCalibrationStore` persists the zero offset as a small TOML file.
use serde::{Deserialize, Serialize};

/// Ingredient CSV schema.
///
/// Expected headers:
/// name,typical_weight,density,category,followed_by
///
/// Example:
/// name,typical_weight,density,category,followed_by
/// flour,120.0,0.53,baking,eggs
/// olive oil,14.0,0.92,fat,
///
/// `followed_by` lists ingredients commonly measured next, separated by
/// semicolons. It may be empty.
#[derive(Debug, Deserialize, Clone)]
pub struct IngredientRow {
    pub name: String,
    pub typical_weight: f32,
    pub density: f32,
    pub category: String,
    pub followed_by: String,
}

impl IngredientRow {
    /// Pairing references, split and trimmed; empty entries are dropped.
    pub fn followed_by_names(&self) -> Vec<&str> {
        self.followed_by
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct FilterCfg {
    /// Kalman process noise (drift the estimate is allowed per step)
    pub process_noise: f32,
    /// Kalman measurement noise (how much a single reading is distrusted)
    pub measurement_noise: f32,
    /// Raw samples retained for rate/trend analysis
    pub history: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            process_noise: 0.01,
            measurement_noise: 0.1,
            history: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitCfg {
    #[default]
    Grams,
    Ounces,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DisplayCfg {
    /// Display refresh rate in Hz
    pub tick_hz: u32,
    /// EMA weight on the previous displayed value, in [0.0, 1.0).
    /// Higher values read steadier but lag faster changes.
    pub smoothing_alpha: f32,
    /// Startup display unit: "grams" or "ounces"
    pub unit: UnitCfg,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            smoothing_alpha: 0.9,
            unit: UnitCfg::Grams,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct StabilityCfg {
    /// Max deviation from the settling anchor that still counts as settled
    pub epsilon_g: f32,
    /// Time the reading must hold within epsilon before it is stable
    pub hold_ms: u64,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            epsilon_g: 0.1,
            hold_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct FlowCfg {
    /// Weight samples retained for flow analysis
    pub history: usize,
    /// Samples used per flow-rate estimate (pairwise deltas)
    pub rate_samples: usize,
    /// Recent rates kept for the variance classification
    pub variance_window: usize,
    /// History length required before a pour is classified
    pub min_classify_samples: usize,
    /// History length required before the final weight is predicted
    pub min_predict_samples: usize,
    /// Average rate above which a pour is in progress (g/s)
    pub pour_threshold_g_per_s: f32,
    /// Variance below this plus speed above `smooth_speed_g_per_s` reads as a smooth pour
    pub smooth_variance: f32,
    pub smooth_speed_g_per_s: f32,
    /// Variance above this reads as an irregular pour
    pub irregular_variance: f32,
    /// Assumed deceleration divisor for the time-to-stable estimate
    pub decel_divisor: f32,
    /// Container weights within this distance merge into one learned pattern
    pub pattern_merge_g: f32,
}

impl Default for FlowCfg {
    fn default() -> Self {
        Self {
            history: 50,
            rate_samples: 3,
            variance_window: 9,
            min_classify_samples: 10,
            min_predict_samples: 5,
            pour_threshold_g_per_s: 2.0,
            smooth_variance: 0.5,
            smooth_speed_g_per_s: 5.0,
            irregular_variance: 2.0,
            decel_divisor: 2.0,
            pattern_merge_g: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct TareCfg {
    /// Max nested tare entries
    pub max_depth: usize,
    /// A stable weight at or above this suggests a new container was set down
    pub auto_new_g: f32,
    /// ...provided the previous stable weight was at or below this
    pub auto_prior_g: f32,
    /// Displayed weights above this are added to the running total on tare
    pub running_total_min_g: f32,
}

impl Default for TareCfg {
    fn default() -> Self {
        Self {
            max_depth: 10,
            auto_new_g: 50.0,
            auto_prior_g: 5.0,
            running_total_min_g: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecognizerCfg {
    /// Suggestions below this confidence are discarded
    pub min_confidence: f32,
    /// Max suggestions surfaced per stable measurement
    pub max_suggestions: usize,
    /// Stable weights below this are ignored (empty-platform noise)
    pub min_weight_g: f32,
    /// Optional ingredient table CSV; the built-in table is used when absent
    pub ingredients: Option<String>,
}

impl Default for RecognizerCfg {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            max_suggestions: 3,
            min_weight_g: 1.0,
            ingredients: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CapacityCfg {
    /// Rated capacity of the surface in grams
    pub max_weight_g: f32,
    /// Fraction of capacity at which the near-full warning arms
    pub warn_fill_ratio: f32,
}

impl Default for CapacityCfg {
    fn default() -> Self {
        Self {
            max_weight_g: 5000.0,
            warn_fill_ratio: 0.9,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Timeouts {
    /// Max wait per touch-batch read before the engine runs a display tick anyway (ms)
    #[serde(alias = "sensor_ms")]
    pub sample_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sample_ms: 150 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub filter: FilterCfg,
    pub display: DisplayCfg,
    pub stability: StabilityCfg,
    pub flow: FlowCfg,
    pub tare: TareCfg,
    pub recognizer: RecognizerCfg,
    pub capacity: CapacityCfg,
    pub timeouts: Timeouts,
    pub logging: Logging,
    /// Optional persisted zero offset; preferred at runtime over the
    /// calibration file when present.
    pub calibration: Option<PersistedCalibration>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
pub struct PersistedCalibration {
    /// Additive zero offset in grams
    pub offset_g: f32,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Filter
        if self.filter.process_noise <= 0.0 {
            eyre::bail!("filter.process_noise must be > 0");
        }
        if self.filter.measurement_noise <= 0.0 {
            eyre::bail!("filter.measurement_noise must be > 0");
        }
        if self.filter.history < 2 {
            eyre::bail!("filter.history must be >= 2");
        }

        // Display
        if self.display.tick_hz == 0 {
            eyre::bail!("display.tick_hz must be > 0");
        }
        if self.display.tick_hz > 1000 {
            eyre::bail!("display.tick_hz is unreasonably high (>1000)");
        }
        if self.display.smoothing_alpha < 0.0 || self.display.smoothing_alpha >= 1.0 {
            eyre::bail!("display.smoothing_alpha must be in [0.0, 1.0)");
        }

        // Stability
        if self.stability.epsilon_g <= 0.0 {
            eyre::bail!("stability.epsilon_g must be > 0");
        }
        if self.stability.hold_ms == 0 {
            eyre::bail!("stability.hold_ms must be >= 1");
        }
        if self.stability.hold_ms > 5 * 60 * 1000 {
            eyre::bail!("stability.hold_ms is unreasonably large (>5min)");
        }

        // Flow
        if self.flow.history < 2 {
            eyre::bail!("flow.history must be >= 2");
        }
        if self.flow.rate_samples < 2 {
            eyre::bail!("flow.rate_samples must be >= 2 (one pairwise delta)");
        }
        if self.flow.variance_window < 2 {
            eyre::bail!("flow.variance_window must be >= 2");
        }
        if self.flow.min_classify_samples < 2 {
            eyre::bail!("flow.min_classify_samples must be >= 2");
        }
        if self.flow.min_predict_samples < 2 {
            eyre::bail!("flow.min_predict_samples must be >= 2");
        }
        if self.flow.pour_threshold_g_per_s < 0.0 {
            eyre::bail!("flow.pour_threshold_g_per_s must be >= 0");
        }
        if self.flow.smooth_variance <= 0.0 {
            eyre::bail!("flow.smooth_variance must be > 0");
        }
        if self.flow.irregular_variance <= self.flow.smooth_variance {
            eyre::bail!("flow.irregular_variance must be > flow.smooth_variance");
        }
        if self.flow.decel_divisor <= 0.0 {
            eyre::bail!("flow.decel_divisor must be > 0");
        }
        if self.flow.pattern_merge_g < 0.0 {
            eyre::bail!("flow.pattern_merge_g must be >= 0");
        }

        // Tare
        if self.tare.max_depth == 0 {
            eyre::bail!("tare.max_depth must be >= 1");
        }
        if self.tare.auto_new_g <= self.tare.auto_prior_g {
            eyre::bail!("tare.auto_new_g must be > tare.auto_prior_g");
        }
        if self.tare.running_total_min_g < 0.0 {
            eyre::bail!("tare.running_total_min_g must be >= 0");
        }

        // Recognizer
        if self.recognizer.min_confidence < 0.0 || self.recognizer.min_confidence > 1.0 {
            eyre::bail!("recognizer.min_confidence must be in [0.0, 1.0]");
        }
        if self.recognizer.max_suggestions == 0 {
            eyre::bail!("recognizer.max_suggestions must be >= 1");
        }
        if self.recognizer.min_weight_g < 0.0 {
            eyre::bail!("recognizer.min_weight_g must be >= 0");
        }

        // Capacity
        if self.capacity.max_weight_g <= 0.0 {
            eyre::bail!("capacity.max_weight_g must be > 0");
        }
        if self.capacity.warn_fill_ratio <= 0.0 || self.capacity.warn_fill_ratio > 1.0 {
            eyre::bail!("capacity.warn_fill_ratio must be in (0.0, 1.0]");
        }

        // Timeouts
        if self.timeouts.sample_ms == 0 {
            eyre::bail!("timeouts.sample_ms must be >= 1");
        }

        Ok(())
    }
}

pub fn load_ingredient_csv(path: &std::path::Path) -> eyre::Result<Vec<IngredientRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open ingredient CSV {:?}: {}", path, e))?;
    parse_ingredient_csv(file)
}

/// Parses ingredient rows from any reader. Header order is fixed so a
/// reordered or renamed column fails loudly instead of silently swapping
/// weights and densities.
pub fn parse_ingredient_csv(rdr: impl std::io::Read) -> eyre::Result<Vec<IngredientRow>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(rdr);

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers: {}", e))?
        .clone();
    let expected = ["name", "typical_weight", "density", "category", "followed_by"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "ingredient CSV must have headers 'name,typical_weight,density,category,followed_by', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<IngredientRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    check_ingredient_rows(&rows)?;
    Ok(rows)
}

/// Semantic checks shared by the CSV loader and callers supplying rows
/// directly: non-empty unique names, positive weights and densities, and
/// pairing references that resolve within the table.
pub fn check_ingredient_rows(rows: &[IngredientRow]) -> eyre::Result<()> {
    if rows.is_empty() {
        eyre::bail!("ingredient table is empty");
    }
    let mut seen = std::collections::HashSet::new();
    for (i, row) in rows.iter().enumerate() {
        let line = i + 2; // header occupies line 1
        if row.name.trim().is_empty() {
            eyre::bail!("ingredient row {} has an empty name", line);
        }
        if !seen.insert(row.name.trim().to_ascii_lowercase()) {
            eyre::bail!("duplicate ingredient name '{}' at row {}", row.name, line);
        }
        if !row.typical_weight.is_finite() || row.typical_weight <= 0.0 {
            eyre::bail!(
                "ingredient '{}' (row {}) has non-positive typical_weight",
                row.name,
                line
            );
        }
        if !row.density.is_finite() || row.density <= 0.0 {
            eyre::bail!("ingredient '{}' (row {}) has non-positive density", row.name, line);
        }
    }
    for (i, row) in rows.iter().enumerate() {
        for follow in row.followed_by_names() {
            if !seen.contains(&follow.to_ascii_lowercase()) {
                eyre::bail!(
                    "ingredient '{}' (row {}) references unknown follow-up '{}'",
                    row.name,
                    i + 2,
                    follow
                );
            }
        }
    }
    Ok(())
}

/// Calibration persisted as a one-field TOML file next to the config.
///
/// Missing file reads as "never calibrated" (`Ok(None)`); a corrupt file is
/// an error so the caller can decide to warn and fall back to zero.
#[derive(Debug, Clone)]
pub struct FileCalibrationStore {
    path: std::path::PathBuf,
}

impl FileCalibrationStore {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl padscale_traits::CalibrationStore for FileCalibrationStore {
    fn load(&mut self) -> Result<Option<f32>, Box<dyn std::error::Error + Send + Sync>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Box::new(e)),
        };
        let parsed: PersistedCalibration = toml::from_str(&text)?;
        Ok(Some(parsed.offset_g))
    }

    fn store(&mut self, offset_g: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let body = toml::to_string(&PersistedCalibration { offset_g })?;
        // Write-then-rename so a crash mid-write never truncates the stored offset.
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
