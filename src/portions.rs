//! # Portion Scaling Module
//!
//! Pure scaling and rendering of ingredient amounts for a requested serving
//! count. Scaling is linear in the base amount; rendering favors what a cook
//! can actually measure, so quarter/third/half fractions become glyphs and
//! large quantities lose their decimal tail.
//!
//! Nothing here touches storage or shared state. The caller owns the
//! currently selected portion count and re-invokes [`scale_recipe`] on every
//! change; invalid input degrades to an unscaled display instead of failing.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound offered by the portion selector.
pub const MAX_PORTIONS: f64 = 50.0;

/// Culinary fractions recognized by the renderer, in hundredths, checked in
/// order.
const FRACTION_GLYPHS: [(i64, &str); 5] = [
    (25, "¼"),
    (33, "⅓"),
    (50, "½"),
    (66, "⅔"),
    (75, "¾"),
];

/// Distance in hundredths within which a remainder snaps to a glyph.
/// Strict, so a remainder of exactly 0.20 stays a decimal.
const FRACTION_TOLERANCE: i64 = 5;

/// Step size of the portion selector.
///
/// Households cooking for odd headcounts run with half steps; the default
/// deployment offers whole portions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortionStep {
    Whole,
    Half,
}

impl PortionStep {
    /// Increment between two adjacent selector positions.
    pub fn increment(&self) -> f64 {
        match self {
            PortionStep::Whole => 1.0,
            PortionStep::Half => 0.5,
        }
    }

    /// Snap a requested portion count onto the selector grid.
    ///
    /// The result is a multiple of the step within `[step, MAX_PORTIONS]`.
    /// Non-finite input collapses to the minimum.
    pub fn clamp(&self, portions: f64) -> f64 {
        let step = self.increment();
        if !portions.is_finite() {
            return step;
        }
        let snapped = (portions / step).round() * step;
        snapped.clamp(step, MAX_PORTIONS)
    }
}

/// One ingredient row submitted for scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalableIngredient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Scaling request for a whole ingredient list.
///
/// Ephemeral request/response data; nothing in it is ever persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleRequest {
    pub base_portions: f64,
    pub requested_portions: f64,
    pub ingredients: Vec<ScalableIngredient>,
}

/// Render-ready ingredient row for the requested portion count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledIngredient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Formatted amount; empty when the row has no usable base amount.
    pub display_amount: String,
}

/// Scale a single base amount to a requested portion count.
///
/// # Arguments
/// * `base_amount` - Ingredient amount at the recipe's base portion count
/// * `base_portions` - Portion count the base amount is written for
/// * `requested_portions` - Portion count to scale to
///
/// # Returns
/// `Some(base_amount * requested_portions / base_portions)`, or `None` when
/// any argument is non-finite, the amount is negative, or either portion
/// count is not positive.
pub fn scale_amount(base_amount: f64, base_portions: f64, requested_portions: f64) -> Option<f64> {
    if !base_amount.is_finite() || base_amount < 0.0 {
        return None;
    }
    if !base_portions.is_finite() || base_portions <= 0.0 {
        return None;
    }
    if !requested_portions.is_finite() || requested_portions <= 0.0 {
        return None;
    }
    Some(base_amount * requested_portions / base_portions)
}

/// Format an amount the way a cook reads it.
///
/// The value is rounded to two decimal places first. Integers render without
/// a decimal part. A fractional remainder close to a common culinary
/// fraction renders as its glyph, prefixed by the whole part when nonzero
/// ("1 ½"). Anything else falls back to a plain decimal whose precision
/// shrinks as the magnitude grows.
///
/// # Arguments
/// * `amount` - Scaled amount to render
///
/// # Returns
/// Display string; empty for non-finite or negative input.
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() || amount < 0.0 {
        return String::new();
    }

    // Working in hundredths keeps the two-decimal rounding exact
    let hundredths = (amount * 100.0).round() as i64;
    let whole = hundredths / 100;
    let remainder = hundredths % 100;

    if remainder == 0 {
        return whole.to_string();
    }

    for (value, glyph) in FRACTION_GLYPHS {
        if (remainder - value).abs() < FRACTION_TOLERANCE {
            return if whole == 0 {
                glyph.to_string()
            } else {
                format!("{} {}", whole, glyph)
            };
        }
    }

    let rounded = hundredths as f64 / 100.0;
    let display = if rounded < 1.0 {
        format!("{:.2}", rounded)
    } else if rounded < 10.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{:.0}", rounded)
    };

    // One-decimal rendering of a near-integer leaves a ".0" tail
    match display.strip_suffix(".0") {
        Some(stripped) => stripped.to_string(),
        None => display,
    }
}

/// Scale every ingredient of a recipe and format the results.
///
/// Rows without a usable base amount keep an empty display string so the
/// caller can fall back to the originally recognized text. When the portion
/// counts themselves are invalid the whole list degrades to unscaled
/// amounts instead of failing.
///
/// # Arguments
/// * `request` - Base portions, requested portions and the ingredient rows
///
/// # Returns
/// One render-ready row per input ingredient, in input order.
pub fn scale_recipe(request: &ScaleRequest) -> Vec<ScaledIngredient> {
    let portions_valid = request.base_portions.is_finite()
        && request.base_portions > 0.0
        && request.requested_portions.is_finite()
        && request.requested_portions > 0.0;

    if !portions_valid {
        debug!(
            target: "portion_scaling",
            base_portions = request.base_portions,
            requested_portions = request.requested_portions,
            "Invalid portion counts, rendering amounts unscaled"
        );
    }

    request
        .ingredients
        .iter()
        .map(|ingredient| {
            let display_amount = match ingredient.base_amount {
                Some(base) if base.is_finite() && base >= 0.0 => {
                    if portions_valid {
                        match scale_amount(
                            base,
                            request.base_portions,
                            request.requested_portions,
                        ) {
                            Some(scaled) => format_amount(scaled),
                            None => format_amount(base),
                        }
                    } else {
                        format_amount(base)
                    }
                }
                _ => String::new(),
            };

            ScaledIngredient {
                name: ingredient.name.clone(),
                unit: ingredient.unit.clone(),
                display_amount,
            }
        })
        .collect()
}
