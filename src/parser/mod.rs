//! # Field Parser Module
//!
//! Heuristic parser turning recognized text lines into a structured recipe
//! draft. The draft is a suggestion for a human to review, never a finished
//! recipe: the parser is deliberately tolerant of false positives and
//! negatives, and a line it cannot classify is kept verbatim in the
//! description rather than dropped.
//!
//! Classification runs the rule chain from [`rules`] over every line; the
//! title is chosen from the first few unclassified lines; timing and portion
//! figures are taken from matching lines anywhere in the document, first
//! qualified figure per field.

pub mod rules;
pub mod units;

pub use rules::{classify_line, parse_quantity, LineMatch, PatternRule, RULE_CHAIN};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::recognition::RecognizedText;

/// Number of leading lines scanned for a title candidate.
const TITLE_SCAN_WINDOW: usize = 5;

/// Plausible title length bounds in characters.
const TITLE_MIN_CHARS: usize = 3;
const TITLE_MAX_CHARS: usize = 60;

/// One ingredient suggestion extracted from a recognized line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientGuess {
    /// The recognized line exactly as classified
    pub raw_line: String,
    /// Ingredient name; falls back to the raw line when no name remained
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Recipe draft produced by the parser.
///
/// Serialized field names follow the autofill payload contract
/// (`prepTimeMinutes`, `basePortions`, ingredient `rawLine`). Absent
/// optionals are omitted from the JSON entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRecipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<IngredientGuess>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_portions: Option<u32>,
}

/// Parse normalized recognition output into a recipe draft.
pub fn parse_recognized_text(recognized: &RecognizedText) -> ParsedRecipe {
    let lines: Vec<&str> = recognized
        .lines
        .iter()
        .map(|line| line.text.as_str())
        .collect();
    parse_lines(&lines)
}

/// Parse a sequence of text lines into a recipe draft.
///
/// Every line is classified by the rule chain. Ingredient lines become
/// `IngredientGuess` entries in document order. Timing and portion figures
/// are collected order-independently, first qualified figure per field, with
/// ambiguous figures left unset rather than guessed. Lines consumed entirely
/// as markers disappear; everything else that is not the title joins the
/// description with line breaks preserved.
///
/// This function never fails: malformed lines fall through to the
/// description untouched.
pub fn parse_lines(lines: &[&str]) -> ParsedRecipe {
    let classifications: Vec<Option<LineMatch>> =
        lines.iter().map(|line| classify_line(line)).collect();

    let title_index = select_title_index(lines, &classifications);

    let mut recipe = ParsedRecipe {
        title: title_index.map_or_else(String::new, |idx| lines[idx].trim().to_string()),
        ..ParsedRecipe::default()
    };
    let mut description_lines: Vec<&str> = Vec::new();

    for (idx, (line, classification)) in lines.iter().zip(&classifications).enumerate() {
        if Some(idx) == title_index {
            continue;
        }

        match classification {
            Some(LineMatch::Ingredient { amount, unit, name }) => {
                let raw_line = line.trim().to_string();
                let name = if name.is_empty() {
                    raw_line.clone()
                } else {
                    name.clone()
                };
                recipe.ingredients.push(IngredientGuess {
                    raw_line,
                    name,
                    amount: Some(*amount),
                    unit: unit.clone(),
                });
            }
            Some(LineMatch::Timing {
                prep_minutes,
                cook_minutes,
                consumes_line,
            }) => {
                if recipe.prep_time_minutes.is_none() {
                    recipe.prep_time_minutes = *prep_minutes;
                }
                if recipe.cook_time_minutes.is_none() {
                    recipe.cook_time_minutes = *cook_minutes;
                }
                if !consumes_line {
                    description_lines.push(line.trim());
                }
            }
            Some(LineMatch::Portion {
                portions,
                consumes_line,
            }) => {
                if recipe.base_portions.is_none() {
                    recipe.base_portions = Some(*portions);
                }
                if !consumes_line {
                    description_lines.push(line.trim());
                }
            }
            None => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    description_lines.push(trimmed);
                }
            }
        }
    }

    recipe.description = description_lines.join("\n");

    debug!(
        target: "recipe_parser",
        ingredients = recipe.ingredients.len(),
        has_title = !recipe.title.is_empty(),
        base_portions = ?recipe.base_portions,
        "Parsed recognized text into recipe draft"
    );

    recipe
}

/// First line in the scan window that no rule classified, carries at least
/// one letter and has a plausible title length. Lines skipped here are still
/// classified normally afterwards.
fn select_title_index(lines: &[&str], classifications: &[Option<LineMatch>]) -> Option<usize> {
    for (idx, line) in lines.iter().take(TITLE_SCAN_WINDOW).enumerate() {
        if classifications[idx].is_some() {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let char_count = trimmed.chars().count();
        if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&char_count) {
            continue;
        }
        if !trimmed.chars().any(char::is_alphabetic) {
            continue;
        }
        return Some(idx);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::{RecognizedLine, RecognizedText};

    #[test]
    fn test_full_recipe_scenario() {
        let recipe = parse_lines(&[
            "Apfelkuchen",
            "200 g Mehl",
            "3 Eier",
            "4 Portionen",
            "Backzeit 45 min",
            "Alles vermischen und backen.",
        ]);

        assert_eq!(recipe.title, "Apfelkuchen");

        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].amount, Some(200.0));
        assert_eq!(recipe.ingredients[0].unit.as_deref(), Some("g"));
        assert_eq!(recipe.ingredients[0].name, "Mehl");
        assert_eq!(recipe.ingredients[1].amount, Some(3.0));
        assert_eq!(recipe.ingredients[1].unit, None);
        assert_eq!(recipe.ingredients[1].name, "Eier");

        assert_eq!(recipe.base_portions, Some(4));
        assert_eq!(recipe.cook_time_minutes, Some(45));
        assert_eq!(recipe.prep_time_minutes, None);

        assert!(recipe.description.contains("Alles vermischen und backen."));
        assert!(!recipe.description.contains("Apfelkuchen"));
        assert!(!recipe.description.contains("Mehl"));
        assert!(!recipe.description.contains("Portionen"));
        assert!(!recipe.description.contains("Backzeit"));
    }

    #[test]
    fn test_title_falls_back_to_empty() {
        let recipe = parse_lines(&["200 g Mehl", "3 Eier", "1 Prise Salz"]);
        assert_eq!(recipe.title, "");
        assert_eq!(recipe.ingredients.len(), 3);
    }

    #[test]
    fn test_title_may_contain_cooking_words() {
        // A keyword alone is not a timing match; only a duration figure is
        let recipe = parse_lines(&["Suppe kochen", "500 ml Brühe"]);
        assert_eq!(recipe.title, "Suppe kochen");
    }

    #[test]
    fn test_purely_numeric_line_is_not_a_title() {
        let recipe = parse_lines(&["12345", "Kartoffelsuppe", "1 kg Kartoffeln"]);
        assert_eq!(recipe.title, "Kartoffelsuppe");
        assert!(recipe.description.contains("12345"));
    }

    #[test]
    fn test_first_qualified_timing_figure_wins() {
        let recipe = parse_lines(&["Backzeit 45 min", "Backzeit 90 min"]);
        assert_eq!(recipe.cook_time_minutes, Some(45));
    }

    #[test]
    fn test_ambiguous_duration_sets_neither_field() {
        let recipe = parse_lines(&["Gulasch", "30 min", "Fleisch anbraten."]);

        assert_eq!(recipe.prep_time_minutes, None);
        assert_eq!(recipe.cook_time_minutes, None);
        assert!(recipe.description.contains("30 min"));
    }

    #[test]
    fn test_garbage_lines_survive_in_description() {
        let recipe = parse_lines(&["###", "!!! ---", "%%%"]);

        assert_eq!(recipe.title, "");
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.description.contains("###"));
        assert!(recipe.description.contains("%%%"));
    }

    #[test]
    fn test_ingredients_preserve_document_order() {
        let recipe = parse_lines(&["1 kg Kartoffeln", "2 Zwiebeln", "200 ml Sahne"]);

        let names: Vec<&str> = recipe
            .ingredients
            .iter()
            .map(|guess| guess.name.as_str())
            .collect();
        assert_eq!(names, vec!["Kartoffeln", "Zwiebeln", "Sahne"]);
    }

    #[test]
    fn test_name_falls_back_to_raw_line() {
        let recipe = parse_lines(&["1 Prise"]);

        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].name, "1 Prise");
        assert_eq!(recipe.ingredients[0].raw_line, "1 Prise");
    }

    #[test]
    fn test_empty_input_yields_empty_draft() {
        let recipe = parse_lines(&[]);
        assert_eq!(recipe, ParsedRecipe::default());
    }

    #[test]
    fn test_parse_from_recognized_text() {
        let recognized = RecognizedText::from_lines(
            vec![
                RecognizedLine {
                    text: "Pfannkuchen".to_string(),
                    confidence: Some(0.9),
                },
                RecognizedLine {
                    text: "250 g Mehl".to_string(),
                    confidence: Some(0.9),
                },
            ],
            7,
        );

        let recipe = parse_recognized_text(&recognized);
        assert_eq!(recipe.title, "Pfannkuchen");
        assert_eq!(recipe.ingredients.len(), 1);
    }

    #[test]
    fn test_payload_field_names() {
        let recipe = parse_lines(&["Apfelkuchen", "200 g Mehl", "Backzeit 45 min"]);
        let value = serde_json::to_value(&recipe).unwrap();

        assert!(value.get("title").is_some());
        assert!(value.get("cookTimeMinutes").is_some());
        assert!(value.get("prepTimeMinutes").is_none());
        assert!(value.get("basePortions").is_none());

        let ingredient = &value.get("ingredients").unwrap()[0];
        assert!(ingredient.get("rawLine").is_some());
        assert_eq!(ingredient.get("unit").unwrap(), "g");
    }
}
