#[cfg(test)]
mod tests {
    use image::{DynamicImage, GrayImage};
    use rezept_scan::config::ExtractionConfig;
    use rezept_scan::extraction::{extract_recipe, ConfidenceLevel};
    use rezept_scan::recognition::{EngineText, RecognitionEngine, RecognitionError};
    use std::io::Cursor;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

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
                    confidence: Some(0.85),
                }),
                None => Err(RecognitionError::Extraction(
                    "scripted engine failure".to_string(),
                )),
            }
        }
    }

    /// Engine fake that stalls longer than any test timeout allows.
    struct SlowEngine;

    impl RecognitionEngine for SlowEngine {
        fn name(&self) -> &str {
            "slow"
        }

        fn recognize(
            &self,
            _image: &DynamicImage,
            _language: &str,
        ) -> Result<EngineText, RecognitionError> {
            std::thread::sleep(Duration::from_secs(3));
            Ok(EngineText {
                text: "zu spät".to_string(),
                confidence: None,
            })
        }
    }

    fn png_payload(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(
            width,
            height,
            image::Luma([210u8]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, image::ImageFormat::Png)
            .expect("encoding test image should succeed");
        buffer.into_inner()
    }

    fn recipe_card_text() -> String {
        [
            "Kaiserschmarrn",
            "Für 4 Personen",
            "- 250 g Mehl",
            "- 4 Eier",
            "- 250 ml Milch",
            "- 1 Prise Salz",
            "Zubereitungszeit: 15 Minuten",
            "Teig verrühren und in der Pfanne goldbraun backen.",
            "Zerrupfen und mit Puderzucker bestreuen.",
        ]
        .join("\n")
    }

    #[tokio::test]
    async fn test_extraction_end_to_end() {
        let engine = Arc::new(ScriptedEngine {
            text: Some(recipe_card_text()),
        });
        let config = ExtractionConfig::default();

        let outcome = extract_recipe(&png_payload(400, 300), engine, &config).await;

        assert!(outcome.success);
        assert_eq!(outcome.recipe.title, "Kaiserschmarrn");
        assert_eq!(outcome.recipe.base_portions, Some(4));
        assert_eq!(outcome.recipe.prep_time_minutes, Some(15));
        assert_eq!(outcome.recipe.ingredients.len(), 4);
        assert_eq!(outcome.confidence, ConfidenceLevel::High);
        assert!(outcome
            .recipe
            .description
            .contains("Zerrupfen und mit Puderzucker bestreuen."));
    }

    #[tokio::test]
    async fn test_extraction_from_file_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&png_payload(320, 240)).unwrap();
        file.flush().unwrap();

        let payload = std::fs::read(file.path()).unwrap();
        let engine = Arc::new(ScriptedEngine {
            text: Some(recipe_card_text()),
        });
        let config = ExtractionConfig::default();

        let outcome = extract_recipe(&payload, engine, &config).await;
        assert!(outcome.success);
        assert_eq!(outcome.recipe.title, "Kaiserschmarrn");
    }

    #[tokio::test]
    async fn test_slow_engine_hits_timeout() {
        let engine = Arc::new(SlowEngine);
        let config = ExtractionConfig {
            recognition_timeout_secs: 1,
            ..Default::default()
        };

        let outcome = extract_recipe(&png_payload(200, 150), engine, &config).await;

        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert!(error.contains("[RECOGNITION]"));
        assert!(error.contains("timed out"));
    }

    #[tokio::test]
    async fn test_rejected_payload_reports_validation_error() {
        let engine = Arc::new(ScriptedEngine {
            text: Some(recipe_card_text()),
        });
        let config = ExtractionConfig::default();

        let outcome = extract_recipe(b"<html>not an image</html>", engine, &config).await;

        assert!(!outcome.success);
        assert_eq!(outcome.confidence, ConfidenceLevel::Low);
        assert!(outcome.recipe.ingredients.is_empty());
        assert!(outcome.error.unwrap().contains("[VALIDATION]"));
    }

    #[tokio::test]
    async fn test_failure_payload_stays_well_formed() {
        let engine = Arc::new(ScriptedEngine { text: None });
        let config = ExtractionConfig::default();

        let outcome = extract_recipe(&png_payload(200, 150), engine, &config).await;
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value.get("success").unwrap(), false);
        assert_eq!(value.get("confidence").unwrap(), "low");
        assert!(value.get("error").is_some());
        assert_eq!(value["recipe"]["title"], "");
        assert_eq!(value["recipe"]["ingredients"].as_array().unwrap().len(), 0);
    }
}
