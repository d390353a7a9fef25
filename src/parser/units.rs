//! # Measurement Unit Vocabulary
//!
//! Fixed vocabulary of German measurement tokens used to tell ingredient
//! lines with a unit apart from bare quantities. Covers mass, volume and the
//! informal kitchen measures that appear on printed recipe cards, plus the
//! spelled-out long forms.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Recognized measurement tokens in their canonical spelling.
pub const UNIT_VOCABULARY: [&str; 32] = [
    // Mass
    "mg", "g", "kg", "Gramm", "Kilogramm",
    // Volume
    "ml", "cl", "dl", "l", "Milliliter", "Liter",
    // Spoons and small measures
    "EL", "TL", "Esslöffel", "Teelöffel", "Msp", "Prise", "Prisen",
    // Kitchen containers
    "Tasse", "Tassen", "Becher", "Dose", "Dosen", "Pack", "Packung",
    // Countable forms
    "Stück", "Stck", "St.", "Scheibe", "Scheiben", "Bund", "Bd",
];

lazy_static! {
    /// Vocabulary sorted longest-first so no token shadows a longer one in
    /// the alternation ("Packung" must be tried before "Pack").
    static ref SORTED_UNITS: Vec<&'static str> = {
        let mut units = UNIT_VOCABULARY.to_vec();
        units.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        units
    };

    /// Lowercased token to canonical spelling, for lookups and case repair.
    static ref CANONICAL_BY_LOWER: HashMap<String, &'static str> = {
        UNIT_VOCABULARY
            .iter()
            .map(|unit| (unit.to_lowercase(), *unit))
            .collect()
    };
}

/// Regex alternation over the vocabulary, escaped and sorted longest-first.
pub fn unit_alternation() -> String {
    SORTED_UNITS
        .iter()
        .map(|unit| regex::escape(unit))
        .collect::<Vec<String>>()
        .join("|")
}

/// Whether the token is a recognized measurement unit, ignoring case.
pub fn is_known_unit(token: &str) -> bool {
    CANONICAL_BY_LOWER.contains_key(&token.to_lowercase())
}

/// Canonical spelling for a matched unit token ("el" becomes "EL").
pub fn canonical_unit(token: &str) -> Option<&'static str> {
    CANONICAL_BY_LOWER.get(&token.to_lowercase()).copied()
}

/// Whether a whitespace-delimited word is a unit token once surrounding
/// punctuation is stripped. Used by the recognized-text quality score.
pub fn contains_unit_token(word: &str) -> bool {
    let bare = word.trim_matches(|c: char| ",;:!?()".contains(c));
    if bare.is_empty() {
        return false;
    }
    is_known_unit(bare) || is_known_unit(bare.trim_end_matches('.'))
}
