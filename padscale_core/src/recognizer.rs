//! Ingredient recognition from weight, density, and measurement context.

use std::cmp::Ordering;

use crate::config::RecognizerCfg;

/// Static profile of one ingredient, as read from the ingredient table.
#[derive(Debug, Clone)]
pub struct IngredientProfile {
    pub name: String,
    /// Weight of one typical measure (g), e.g. a cup of flour.
    pub typical_weight_g: f32,
    /// Bulk density in g/mL.
    pub density: f32,
    pub category: String,
    /// Ingredients commonly measured next.
    pub followed_by: Vec<String>,
}

/// A fixed keyword rule: if any of the trigger words appear in the context,
/// suggest the named ingredient at a fixed confidence.
#[derive(Debug, Clone)]
pub struct ContextRule {
    pub any_of: Vec<String>,
    pub suggests: String,
    pub confidence: f32,
}

/// Read-only ingredient lookup table plus its context rules. Constructed
/// once and injected into the recognizer; never a process-wide global.
#[derive(Debug, Clone)]
pub struct IngredientTable {
    profiles: Vec<IngredientProfile>,
    rules: Vec<ContextRule>,
}

impl IngredientTable {
    pub fn new(profiles: Vec<IngredientProfile>, rules: Vec<ContextRule>) -> Self {
        Self { profiles, rules }
    }

    /// Common kitchen staples with per-measure weights and bulk densities.
    pub fn builtin() -> Self {
        let p = |name: &str, typical: f32, density: f32, category: &str, follows: &[&str]| {
            IngredientProfile {
                name: name.to_string(),
                typical_weight_g: typical,
                density,
                category: category.to_string(),
                followed_by: follows.iter().map(|s| (*s).to_string()).collect(),
            }
        };
        let profiles = vec![
            p("flour", 120.0, 0.53, "baking", &["eggs"]),
            p("sugar", 200.0, 0.85, "baking", &["eggs"]),
            p("butter", 113.0, 0.91, "dairy", &["sugar"]),
            p("eggs", 50.0, 1.03, "dairy", &["flour"]),
            p("milk", 244.0, 1.03, "dairy", &[]),
            p("water", 237.0, 1.0, "liquid", &[]),
            p("honey", 21.0, 1.42, "sweetener", &[]),
            p("salt", 6.0, 1.2, "seasoning", &[]),
            p("oil", 14.0, 0.92, "fat", &[]),
            p("onion", 110.0, 0.74, "produce", &["oil"]),
            p("garlic", 5.0, 0.62, "produce", &["oil"]),
            p("rice", 185.0, 0.85, "grain", &[]),
            p("oats", 90.0, 0.41, "grain", &[]),
            p("cocoa", 85.0, 0.52, "baking", &[]),
        ];
        Self::new(profiles, Self::default_context_rules())
    }

    /// The fixed keyword rule set: measuring flour or sugar usually means
    /// eggs come next; onion or garlic usually means oil.
    pub fn default_context_rules() -> Vec<ContextRule> {
        vec![
            ContextRule {
                any_of: vec!["flour".into(), "sugar".into()],
                suggests: "eggs".into(),
                confidence: 0.7,
            },
            ContextRule {
                any_of: vec!["onion".into(), "garlic".into()],
                suggests: "oil".into(),
                confidence: 0.8,
            },
        ]
    }

    pub fn find(&self, name: &str) -> Option<&IngredientProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn profiles(&self) -> &[IngredientProfile] {
        &self.profiles
    }

    pub fn rules(&self) -> &[ContextRule] {
        &self.rules
    }
}

/// One ranked candidate for what was just measured. Always derived,
/// never persisted.
#[derive(Debug, Clone)]
pub struct MeasurementSuggestion {
    pub name: String,
    pub confidence: f32,
    pub reason: String,
    pub next_likely: Vec<String>,
}

/// Matches a stable weight (and optional density) against the ingredient
/// table, refines with density, and folds in context keyword rules.
#[derive(Debug)]
pub struct IngredientRecognizer {
    table: IngredientTable,
    cfg: RecognizerCfg,
}

impl IngredientRecognizer {
    pub fn new(table: IngredientTable, cfg: &RecognizerCfg) -> Self {
        Self { table, cfg: *cfg }
    }

    pub fn table(&self) -> &IngredientTable {
        &self.table
    }

    /// Rank candidate ingredients for a measured weight.
    ///
    /// Weight matching uses two tolerances: a wide one to admit candidates at
    /// all, and a tight one inside which confidence degrades linearly.
    /// Candidates surviving the weight stage, plus any context-rule hits, are
    /// density-refined and the best `max_suggestions` are returned in
    /// descending confidence order. No match is an empty list, not an error.
    pub fn analyze(
        &self,
        weight_g: f32,
        density: Option<f32>,
        context: &[String],
    ) -> Vec<MeasurementSuggestion> {
        let mut out: Vec<MeasurementSuggestion> = Vec::new();

        for p in &self.table.profiles {
            let diff = (weight_g - p.typical_weight_g).abs();
            let admit_tol = 5.0f32.max(0.2 * p.typical_weight_g);
            if diff > admit_tol {
                continue;
            }
            let tol = 2.0f32.max(0.1 * p.typical_weight_g);
            let confidence = if diff <= tol {
                1.0 - diff / tol
            } else {
                (1.0 - diff / p.typical_weight_g).max(0.0)
            };
            if confidence > self.cfg.min_confidence {
                out.push(MeasurementSuggestion {
                    name: p.name.clone(),
                    confidence,
                    reason: format!(
                        "{weight_g:.0} g is close to a typical {} measure ({:.0} g)",
                        p.name, p.typical_weight_g
                    ),
                    next_likely: p.followed_by.clone(),
                });
            }
        }

        for rule in &self.table.rules {
            let triggered = rule.any_of.iter().any(|keyword| {
                context
                    .iter()
                    .any(|word| word.eq_ignore_ascii_case(keyword))
            });
            if !triggered {
                continue;
            }
            let next_likely = self
                .table
                .find(&rule.suggests)
                .map(|p| p.followed_by.clone())
                .unwrap_or_default();
            merge_suggestion(
                &mut out,
                MeasurementSuggestion {
                    name: rule.suggests.clone(),
                    confidence: rule.confidence,
                    reason: format!("often measured after {}", rule.any_of.join(" or ")),
                    next_likely,
                },
            );
        }

        if let Some(d) = density.filter(|d| d.is_finite() && *d > 0.0) {
            for s in &mut out {
                let expected = self.table.find(&s.name).map_or(1.0, |p| p.density);
                let factor = (1.0 - (d - expected).abs() / expected).max(0.0);
                s.confidence = (s.confidence * factor).clamp(0.0, 1.0);
            }
        }

        out.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        out.truncate(self.cfg.max_suggestions);
        out
    }
}

/// Keep one entry per ingredient name, preferring the higher confidence.
fn merge_suggestion(out: &mut Vec<MeasurementSuggestion>, candidate: MeasurementSuggestion) {
    match out
        .iter_mut()
        .find(|s| s.name.eq_ignore_ascii_case(&candidate.name))
    {
        Some(existing) => {
            if candidate.confidence > existing.confidence {
                *existing = candidate;
            }
        }
        None => out.push(candidate),
    }
}
