//! Display units and weight formatting.
//!
//! All engine state is kept in grams; conversion happens only at the
//! presentation edge.

/// Grams per ounce used for display conversion.
pub const GRAMS_PER_OUNCE: f32 = 28.35;
/// Ounces per gram used for display conversion.
pub const OUNCES_PER_GRAM: f32 = 0.035_274;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightUnit {
    #[default]
    Grams,
    Ounces,
}

impl WeightUnit {
    /// The other unit; used by the toggle command.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Grams => Self::Ounces,
            Self::Ounces => Self::Grams,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Grams => "g",
            Self::Ounces => "oz",
        }
    }
}

#[inline]
pub fn grams_to_ounces(g: f32) -> f32 {
    g * OUNCES_PER_GRAM
}

#[inline]
pub fn ounces_to_grams(oz: f32) -> f32 {
    oz * GRAMS_PER_OUNCE
}

/// Convert a gram value into the given display unit.
#[inline]
pub fn in_unit(grams: f32, unit: WeightUnit) -> f32 {
    match unit {
        WeightUnit::Grams => grams,
        WeightUnit::Ounces => grams_to_ounces(grams),
    }
}

/// Format a gram value for display.
///
/// Small readings keep a decimal so a pinch of salt doesn't round away;
/// larger readings drop precision the reading can't support anyway.
/// Grams: one decimal below 10 g, whole numbers above.
/// Ounces: two decimals below 1 oz, one decimal above.
pub fn format_weight(grams: f32, unit: WeightUnit) -> String {
    match unit {
        WeightUnit::Grams => {
            if grams.abs() < 10.0 {
                format!("{grams:.1} g")
            } else {
                format!("{grams:.0} g")
            }
        }
        WeightUnit::Ounces => {
            let oz = grams_to_ounces(grams);
            if oz.abs() < 1.0 {
                format!("{oz:.2} oz")
            } else {
                format!("{oz:.1} oz")
            }
        }
    }
}
