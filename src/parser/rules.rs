//! # Line Pattern Rules
//!
//! Explicit pattern-rule objects for classifying one recognized line. Each
//! rule owns its compiled patterns and can be tested on its own; the chain
//! evaluates them per line in a fixed priority order:
//!
//! 1. `UnitQuantity` - strictly more specific than a bare quantity, so
//!    "2 EL Zucker" never parses as amount 2 with name "EL Zucker"
//! 2. `Timing` and `Portion` - marker lines like "Backzeit 45 min" or
//!    "4 Portionen" must not be misread as ingredients
//! 3. `BareQuantity` - least specific, tried last
//!
//! No rule panics on malformed input; a line no rule accepts stays
//! unclassified and flows to the recipe description.

use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;
use tracing::debug;

use super::units::{canonical_unit, unit_alternation};

/// Leading quantity grammar: mixed numbers ("1 1/2", "1 ½"), ASCII
/// fractions, fraction glyphs, decimals with comma or dot, integers.
const QUANTITY_PATTERN: &str =
    r"(?:\d+\s+\d+/\d+|\d+\s*[¼⅓½⅔¾]|\d+/\d+|[¼⅓½⅔¾]|\d+[.,]\d+|\d+)";

/// Keywords marking a duration as preparation time.
pub const PREPARATION_KEYWORDS: [&str; 3] = ["zubereitung", "vorbereitung", "arbeitszeit"];

/// Keywords marking a duration as cooking or baking time.
pub const COOKING_KEYWORDS: [&str; 7] = [
    "backzeit", "backen", "kochzeit", "kochen", "garzeit", "garen", "ofen",
];

/// Filler words that may remain on a line while it still counts as a pure
/// timing or portion marker ("Backzeit: ca. 45 min").
const MARKER_FILLER_WORDS: [&str; 5] = ["ca", "für", "etwa", "ungefähr", "ergibt"];

lazy_static! {
    static ref UNIT_QUANTITY_PATTERN: Regex = Regex::new(&format!(
        r"(?i)^(?P<qty>{})\s*(?P<unit>{})(?:\s+(?P<name>.*?))?\s*$",
        QUANTITY_PATTERN,
        unit_alternation()
    ))
    .expect("unit quantity pattern should be valid");

    static ref BARE_QUANTITY_PATTERN: Regex = Regex::new(&format!(
        r"^(?P<qty>{})\s*(?P<name>\pL.*?)\s*$",
        QUANTITY_PATTERN
    ))
    .expect("bare quantity pattern should be valid");

    // Applied to lowercased lines, hence no (?i). The figure accepts a
    // decimal tail so "1,5 Std" is read as one and a half hours rather
    // than tail-matching the lone "5"
    static ref DURATION_PATTERN: Regex =
        Regex::new(r"\b(\d{1,3}(?:[.,]\d+)?)\s*(minuten|minute|min|stunden|stunde|std)\b")
            .expect("duration pattern should be valid");

    static ref PORTION_PATTERN: Regex =
        Regex::new(r"\b(\d{1,2})\s*(portionen|portion|personen|person|pers)\b")
            .expect("portion pattern should be valid");
}

/// Outcome of matching one line against a rule
#[derive(Debug, Clone, PartialEq)]
pub enum LineMatch {
    /// An ingredient line with a parsed quantity
    Ingredient {
        amount: f64,
        unit: Option<String>,
        name: String,
    },
    /// A line carrying a duration figure. Fields stay `None` when no
    /// qualifying keyword is present; ambiguity is resolved by omission.
    Timing {
        prep_minutes: Option<u32>,
        cook_minutes: Option<u32>,
        consumes_line: bool,
    },
    /// A line carrying a portion count
    Portion { portions: u32, consumes_line: bool },
}

/// The four line classification rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRule {
    UnitQuantity,
    Timing,
    Portion,
    BareQuantity,
}

/// Fixed evaluation order; the first rule that matches a line wins.
pub const RULE_CHAIN: [PatternRule; 4] = [
    PatternRule::UnitQuantity,
    PatternRule::Timing,
    PatternRule::Portion,
    PatternRule::BareQuantity,
];

impl PatternRule {
    /// Match one trimmed line against this rule.
    pub fn apply(&self, line: &str) -> Option<LineMatch> {
        match self {
            PatternRule::UnitQuantity => apply_unit_quantity(line),
            PatternRule::Timing => apply_timing(line),
            PatternRule::Portion => apply_portion(line),
            PatternRule::BareQuantity => apply_bare_quantity(line),
        }
    }
}

/// Run the rule chain over one line. Returns `None` for lines no rule
/// accepts; those flow to the recipe description untouched.
pub fn classify_line(line: &str) -> Option<LineMatch> {
    let stripped = strip_list_bullet(line.trim());
    if stripped.is_empty() {
        return None;
    }
    RULE_CHAIN.iter().find_map(|rule| rule.apply(stripped))
}

/// Parse a quantity prefix into a number.
///
/// Accepts integers, decimals with `.` or `,`, ASCII fractions ("1/2"),
/// fraction glyphs (½), and mixed numbers ("1 ½", "1 1/2"). Returns `None`
/// for anything that does not form a finite non-negative value.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(last) = text.chars().last() {
        if let Some(fraction) = fraction_glyph_value(last) {
            let whole_text = text[..text.len() - last.len_utf8()].trim();
            let whole = if whole_text.is_empty() {
                0.0
            } else {
                whole_text.parse::<f64>().ok()?
            };
            return finite_non_negative(whole + fraction);
        }
    }

    if text.contains('/') {
        let parts: Vec<&str> = text.split_whitespace().collect();
        let (whole, fraction_text) = match parts.as_slice() {
            [fraction] => (0.0, *fraction),
            [whole, fraction] => (whole.parse::<f64>().ok()?, *fraction),
            _ => return None,
        };
        let (numerator, denominator) = fraction_text.split_once('/')?;
        let numerator = numerator.trim().parse::<f64>().ok()?;
        let denominator = denominator.trim().parse::<f64>().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return finite_non_negative(whole + numerator / denominator);
    }

    finite_non_negative(text.replace(',', ".").parse::<f64>().ok()?)
}

fn fraction_glyph_value(c: char) -> Option<f64> {
    match c {
        '¼' => Some(0.25),
        '⅓' => Some(1.0 / 3.0),
        '½' => Some(0.5),
        '⅔' => Some(2.0 / 3.0),
        '¾' => Some(0.75),
        _ => None,
    }
}

fn finite_non_negative(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn strip_list_bullet(line: &str) -> &str {
    for bullet in ['-', '•', '*'] {
        if let Some(rest) = line.strip_prefix(bullet) {
            if rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }
    line
}

fn clean_ingredient_name(raw: &str) -> String {
    raw.trim()
        .trim_end_matches([',', ';', ':', '.'])
        .trim_end()
        .to_string()
}

fn apply_unit_quantity(line: &str) -> Option<LineMatch> {
    let caps = UNIT_QUANTITY_PATTERN.captures(line)?;
    let qty_text = caps.name("qty")?.as_str();
    let amount = match parse_quantity(qty_text) {
        Some(amount) => amount,
        None => {
            debug!(
                target: "recipe_parser",
                line = %line,
                "Matched quantity did not parse, leaving line unclassified"
            );
            return None;
        }
    };

    let matched_unit = caps.name("unit")?.as_str();
    let unit = canonical_unit(matched_unit)
        .map(str::to_string)
        .unwrap_or_else(|| matched_unit.to_string());

    let name = clean_ingredient_name(caps.name("name").map_or("", |m| m.as_str()));

    Some(LineMatch::Ingredient {
        amount,
        unit: Some(unit),
        name,
    })
}

fn apply_bare_quantity(line: &str) -> Option<LineMatch> {
    let caps = BARE_QUANTITY_PATTERN.captures(line)?;
    let qty_text = caps.name("qty")?.as_str();
    let amount = match parse_quantity(qty_text) {
        Some(amount) => amount,
        None => {
            debug!(
                target: "recipe_parser",
                line = %line,
                "Matched quantity did not parse, leaving line unclassified"
            );
            return None;
        }
    };

    let name = clean_ingredient_name(caps.name("name")?.as_str());

    Some(LineMatch::Ingredient {
        amount,
        unit: None,
        name,
    })
}

/// Alphanumeric word runs with their byte ranges, for marker detection.
fn alphanumeric_words(text: &str) -> Vec<(Range<usize>, &str)> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    for (idx, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(idx);
            }
        } else if let Some(s) = start.take() {
            words.push((s..idx, &text[s..idx]));
        }
    }
    if let Some(s) = start {
        words.push((s..text.len(), &text[s..]));
    }
    words
}

fn ranges_overlap(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Distance in bytes between two non-overlapping ranges, zero on overlap.
fn range_gap(a: &Range<usize>, b: &Range<usize>) -> usize {
    if a.start >= b.end {
        a.start - b.end
    } else if b.start >= a.end {
        b.start - a.end
    } else {
        0
    }
}

fn is_timing_keyword(word: &str) -> bool {
    PREPARATION_KEYWORDS
        .iter()
        .chain(COOKING_KEYWORDS.iter())
        .any(|keyword| word.contains(*keyword))
}

fn apply_timing(line: &str) -> Option<LineMatch> {
    // Keyword matching and remainder checks run on a lowercased copy so
    // byte positions stay consistent
    let lowered = line.to_lowercase();

    let mut durations: Vec<(Range<usize>, u32)> = Vec::new();
    for caps in DURATION_PATTERN.captures_iter(&lowered) {
        let (Some(whole), Some(value), Some(unit)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let Ok(figure) = value.as_str().replace(',', ".").parse::<f64>() else {
            continue;
        };
        let minutes = if unit.as_str().starts_with("st") {
            (figure * 60.0).round() as u32
        } else {
            figure.round() as u32
        };
        durations.push((whole.range(), minutes));
    }
    if durations.is_empty() {
        return None;
    }

    let words = alphanumeric_words(&lowered);

    let keyword_range = |keywords: &[&str]| -> Option<Range<usize>> {
        words
            .iter()
            .find(|(_, word)| keywords.iter().any(|keyword| word.contains(*keyword)))
            .map(|(range, _)| range.clone())
    };
    let prep_keyword = keyword_range(&PREPARATION_KEYWORDS);
    let cook_keyword = keyword_range(&COOKING_KEYWORDS);

    let nearest = |keyword: &Range<usize>| -> usize {
        durations
            .iter()
            .enumerate()
            .min_by_key(|(_, (span, _))| range_gap(span, keyword))
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    };

    let (prep_minutes, cook_minutes) = match (&prep_keyword, &cook_keyword) {
        (None, None) => (None, None),
        (Some(prep), None) => (Some(durations[nearest(prep)].1), None),
        (None, Some(cook)) => (None, Some(durations[nearest(cook)].1)),
        (Some(prep), Some(cook)) => {
            let prep_idx = nearest(prep);
            let cook_idx = nearest(cook);
            if prep_idx == cook_idx {
                // One figure claimed by both phases: the closer keyword wins
                if range_gap(&durations[prep_idx].0, prep) <= range_gap(&durations[cook_idx].0, cook)
                {
                    (Some(durations[prep_idx].1), None)
                } else {
                    (None, Some(durations[cook_idx].1))
                }
            } else {
                (Some(durations[prep_idx].1), Some(durations[cook_idx].1))
            }
        }
    };

    // A line is consumed as a marker only when a phase was assigned and
    // nothing but the duration, keywords and filler remains
    let assigned = prep_minutes.is_some() || cook_minutes.is_some();
    let consumes_line = assigned
        && words.iter().all(|(range, word)| {
            durations.iter().any(|(span, _)| ranges_overlap(span, range))
                || is_timing_keyword(word)
                || MARKER_FILLER_WORDS.contains(word)
        });

    Some(LineMatch::Timing {
        prep_minutes,
        cook_minutes,
        consumes_line,
    })
}

fn apply_portion(line: &str) -> Option<LineMatch> {
    let lowered = line.to_lowercase();

    let caps = PORTION_PATTERN.captures(&lowered)?;
    let span = caps.get(0)?.range();
    let portions = caps.get(1)?.as_str().parse::<u32>().ok()?;
    if portions == 0 {
        return None;
    }

    let words = alphanumeric_words(&lowered);
    let consumes_line = words.iter().all(|(range, word)| {
        ranges_overlap(&span, range) || MARKER_FILLER_WORDS.contains(word)
    });

    Some(LineMatch::Portion {
        portions,
        consumes_line,
    })
}
