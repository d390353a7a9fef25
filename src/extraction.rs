//! # Recipe Extraction Pipeline
//!
//! Orchestrates the full photo-to-draft flow: upload validation, image
//! preprocessing, text recognition and field parsing. The outcome of
//! [`extract_recipe`] is always well-formed; when any stage fails the result
//! degrades to an empty draft carrying `success = false` and the failure
//! message, because the caller's form works fine without autofill and a
//! failed recognition is not worth a retry on identical input.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ExtractionConfig;
use crate::errors::{error_logging, AppError, AppResult};
use crate::parser::{parse_recognized_text, ParsedRecipe};
use crate::preprocessing::prepare_image;
use crate::recognition::{evaluate_text_quality, recognize_text, RecognitionEngine};
use crate::validation::{validate_decoded_dimensions, validate_image_payload};

/// Portion of the confidence score granted by raw text quality.
const QUALITY_SCORE_CAP: f32 = 40.0;
/// Score granted for a usable title.
const TITLE_SCORE: f32 = 20.0;

/// Titles at or below this length do not count toward the score.
const MIN_SCORED_TITLE_CHARS: usize = 3;
/// Score granted per recognized ingredient, capped.
const INGREDIENT_SCORE: f32 = 10.0;
const INGREDIENT_SCORE_CAP: f32 = 30.0;
/// Score granted for a substantial description.
const DESCRIPTION_SCORE: f32 = 10.0;
const MIN_SCORED_DESCRIPTION_CHARS: usize = 20;

const HIGH_CONFIDENCE_THRESHOLD: f32 = 70.0;
const MEDIUM_CONFIDENCE_THRESHOLD: f32 = 35.0;

/// Coarse reviewer guidance for a returned draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    fn from_score(score: f32) -> Self {
        if score >= HIGH_CONFIDENCE_THRESHOLD {
            ConfidenceLevel::High
        } else if score >= MEDIUM_CONFIDENCE_THRESHOLD {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Autofill payload handed back to the form layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    pub success: bool,
    pub recipe: ParsedRecipe,
    pub confidence: ConfidenceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionOutcome {
    fn degraded(error: &AppError) -> Self {
        Self {
            success: false,
            recipe: ParsedRecipe::default(),
            confidence: ConfidenceLevel::Low,
            error: Some(error.to_string()),
        }
    }
}

/// Run the complete extraction pipeline on an uploaded image payload.
///
/// # Arguments
///
/// * `payload` - Raw upload bytes (JPEG or PNG)
/// * `engine` - Recognition engine to run the prepared image through
/// * `config` - Extraction configuration
///
/// # Returns
///
/// A well-formed [`ExtractionOutcome`] in every case. Validation,
/// preprocessing and recognition failures produce an empty draft with the
/// error message attached instead of propagating.
pub async fn extract_recipe(
    payload: &[u8],
    engine: Arc<dyn RecognitionEngine>,
    config: &ExtractionConfig,
) -> ExtractionOutcome {
    match run_pipeline(payload, engine, config).await {
        Ok(outcome) => outcome,
        Err(error) => {
            error_logging::log_extraction_degraded(
                &error,
                "extract_recipe",
                Some(payload.len() as u64),
            );
            ExtractionOutcome::degraded(&error)
        }
    }
}

async fn run_pipeline(
    payload: &[u8],
    engine: Arc<dyn RecognitionEngine>,
    config: &ExtractionConfig,
) -> AppResult<ExtractionOutcome> {
    validate_image_payload(payload, config).map_err(|error| {
        error_logging::log_validation_error(
            &error,
            "extract_recipe",
            Some(payload.len() as u64),
            None,
        );
        error
    })?;

    let decoded = image::load_from_memory(payload).map_err(|error| {
        let error = AppError::ImageUnreadable(format!("could not decode image payload: {}", error));
        error_logging::log_preprocessing_error(&error, "decode", None);
        error
    })?;
    validate_decoded_dimensions(decoded.width(), decoded.height())?;

    let prepared = prepare_image(&decoded, config).map_err(|error| {
        error_logging::log_preprocessing_error(
            &error,
            "prepare_image",
            Some((decoded.width(), decoded.height())),
        );
        AppError::from(error)
    })?;

    let engine_name = engine.name().to_string();
    let recognized = recognize_text(
        engine,
        prepared.image,
        &config.language,
        Duration::from_secs(config.recognition_timeout_secs),
    )
    .await
    .map_err(|error| {
        error_logging::log_recognition_error(
            &error,
            "extract_recipe",
            &engine_name,
            &config.language,
            None,
        );
        AppError::from(error)
    })?;

    let text_quality = evaluate_text_quality(&recognized);
    let recipe = parse_recognized_text(&recognized);
    let score = confidence_score(text_quality, &recipe);
    let confidence = ConfidenceLevel::from_score(score);

    info!(
        target: "recipe_extraction",
        engine = %engine_name,
        text_quality = text_quality,
        confidence_score = score,
        confidence = ?confidence,
        ingredients = recipe.ingredients.len(),
        "Extraction pipeline completed"
    );

    Ok(ExtractionOutcome {
        success: true,
        recipe,
        confidence,
        error: None,
    })
}

/// Combine raw text quality with the amount of recipe structure recovered.
///
/// Text quality contributes at most 40 points; a title, the ingredient
/// count and a substantial description contribute the rest. The score is
/// bounded to 0-100 by construction.
fn confidence_score(text_quality: f32, recipe: &ParsedRecipe) -> f32 {
    let mut score = (text_quality / 2.0).min(QUALITY_SCORE_CAP);

    if recipe.title.chars().count() > MIN_SCORED_TITLE_CHARS {
        score += TITLE_SCORE;
    }
    score += (recipe.ingredients.len() as f32 * INGREDIENT_SCORE).min(INGREDIENT_SCORE_CAP);
    if recipe.description.chars().count() > MIN_SCORED_DESCRIPTION_CHARS {
        score += DESCRIPTION_SCORE;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::IngredientGuess;
    use crate::recognition::{EngineText, RecognitionError};
    use image::{DynamicImage, GrayImage};
    use std::io::Cursor;

    /// Engine fake returning a fixed text, or a failure when `text` is None.
    struct ScriptedEngine {
        text: Option<String>,
    }

    impl RecognitionEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn recognize(
            &self,
            _image: &DynamicImage,
            _language: &str,
        ) -> Result<EngineText, RecognitionError> {
            match &self.text {
                Some(text) => Ok(EngineText {
                    text: text.clone(),
                    confidence: Some(0.9),
                }),
                None => Err(RecognitionError::Extraction(
                    "scripted engine failure".to_string(),
                )),
            }
        }
    }

    fn png_payload(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(
            width,
            height,
            image::Luma([200u8]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, image::ImageFormat::Png)
            .expect("encoding test image should succeed");
        buffer.into_inner()
    }

    fn recipe_photo_text() -> String {
        [
            "Apfelkuchen",
            "200 g Mehl",
            "3 Eier",
            "4 Portionen",
            "Backzeit 45 min",
            "Alles vermischen und backen.",
        ]
        .join("\n")
    }

    #[tokio::test]
    async fn test_extraction_happy_path() {
        let engine = Arc::new(ScriptedEngine {
            text: Some(recipe_photo_text()),
        });
        let config = ExtractionConfig::default();

        let outcome = extract_recipe(&png_payload(64, 48), engine, &config).await;

        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.recipe.title, "Apfelkuchen");
        assert_eq!(outcome.recipe.ingredients.len(), 2);
        assert_eq!(outcome.recipe.base_portions, Some(4));
        assert_eq!(outcome.confidence, ConfidenceLevel::High);
    }

    #[tokio::test]
    async fn test_non_image_payload_degrades() {
        let engine = Arc::new(ScriptedEngine {
            text: Some(recipe_photo_text()),
        });
        let config = ExtractionConfig::default();

        let outcome =
            extract_recipe(b"definitely not an image payload here", engine, &config).await;

        assert!(!outcome.success);
        assert_eq!(outcome.recipe, ParsedRecipe::default());
        assert_eq!(outcome.confidence, ConfidenceLevel::Low);
        assert!(outcome.error.unwrap().contains("[VALIDATION]"));
    }

    #[tokio::test]
    async fn test_engine_failure_degrades() {
        let engine = Arc::new(ScriptedEngine { text: None });
        let config = ExtractionConfig::default();

        let outcome = extract_recipe(&png_payload(64, 48), engine, &config).await;

        assert!(!outcome.success);
        assert_eq!(outcome.recipe, ParsedRecipe::default());
        assert!(outcome.error.unwrap().contains("[RECOGNITION]"));
    }

    #[tokio::test]
    async fn test_blank_photo_degrades() {
        // Engine finds nothing on a blank page
        let engine = Arc::new(ScriptedEngine {
            text: Some("   \n  ".to_string()),
        });
        let config = ExtractionConfig::default();

        let outcome = extract_recipe(&png_payload(64, 48), engine, &config).await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("[RECOGNITION]"));
    }

    #[test]
    fn test_confidence_score_rewards_structure() {
        let empty = ParsedRecipe::default();
        assert_eq!(confidence_score(0.0, &empty), 0.0);

        let full = ParsedRecipe {
            title: "Apfelkuchen".to_string(),
            description: "Alles vermischen und backen, dann servieren.".to_string(),
            ingredients: vec![
                IngredientGuess {
                    raw_line: "200 g Mehl".to_string(),
                    name: "Mehl".to_string(),
                    amount: Some(200.0),
                    unit: Some("g".to_string()),
                },
                IngredientGuess {
                    raw_line: "3 Eier".to_string(),
                    name: "Eier".to_string(),
                    amount: Some(3.0),
                    unit: None,
                },
                IngredientGuess {
                    raw_line: "1 Prise Salz".to_string(),
                    name: "Salz".to_string(),
                    amount: Some(1.0),
                    unit: Some("Prise".to_string()),
                },
                IngredientGuess {
                    raw_line: "100 ml Milch".to_string(),
                    name: "Milch".to_string(),
                    amount: Some(100.0),
                    unit: Some("ml".to_string()),
                },
            ],
            ..ParsedRecipe::default()
        };

        // 40 quality + 20 title + 30 ingredient cap + 10 description
        assert_eq!(confidence_score(100.0, &full), 100.0);
    }

    #[test]
    fn test_confidence_level_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(100.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(70.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(69.9), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(35.0), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(34.9), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.0), ConfidenceLevel::Low);
    }

    #[tokio::test]
    async fn test_outcome_payload_shape() {
        let engine = Arc::new(ScriptedEngine {
            text: Some(recipe_photo_text()),
        });
        let config = ExtractionConfig::default();

        let outcome = extract_recipe(&png_payload(64, 48), engine, &config).await;
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value.get("success").unwrap(), true);
        assert_eq!(value.get("confidence").unwrap(), "high");
        assert!(value.get("error").is_none());
        assert!(value.get("recipe").unwrap().get("title").is_some());
    }
}
