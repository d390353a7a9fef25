//! # Tesseract Engine Module
//!
//! Production `RecognitionEngine` implementation backed by Tesseract through
//! the `leptess` binding. Loaded instances are pooled per language because
//! Tesseract initialization costs hundreds of milliseconds; reuse makes
//! repeated extractions cheap.

use image::DynamicImage;
use leptess::LepTess;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;

use super::{EngineText, RecognitionEngine, RecognitionError};
use crate::config::{ExtractionConfig, PageSegMode};

/// Well-known tessdata installation directories, probed in order when no
/// explicit path is configured.
const TESSDATA_LOCATIONS: [&str; 4] = [
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
];

/// Tesseract-backed recognition engine with a per-language instance pool.
///
/// Each language keeps one loaded `LepTess` instance behind a mutex; callers
/// serialize on the instance for the duration of a single recognition. The
/// pool itself is guarded separately so instance creation for one language
/// never blocks recognition in another.
pub struct TesseractEngine {
    tessdata_path: Option<String>,
    page_seg_mode: PageSegMode,
    character_whitelist: Option<String>,
    instances: Mutex<HashMap<String, Arc<Mutex<LepTess>>>>,
}

impl TesseractEngine {
    /// Create an engine from the extraction configuration.
    ///
    /// No Tesseract instance is loaded yet; instances are created lazily on
    /// the first recognition per language so startup stays fast and a
    /// missing language model only fails the requests that need it.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            tessdata_path: config.tessdata_path.clone(),
            page_seg_mode: config.page_seg_mode,
            character_whitelist: config.character_whitelist.clone(),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create the pooled instance for a language.
    fn instance_for(&self, language: &str) -> Result<Arc<Mutex<LepTess>>, RecognitionError> {
        {
            let instances = self.instances.lock();
            if let Some(instance) = instances.get(language) {
                return Ok(Arc::clone(instance));
            }
        }

        info!(
            target: "ocr_recognition",
            language = %language,
            "Creating new Tesseract instance"
        );

        let tessdata_path = Self::resolve_tessdata_path(self.tessdata_path.as_deref());

        let mut tess = LepTess::new(tessdata_path.as_deref(), language).map_err(|e| {
            RecognitionError::Initialization(format!(
                "failed to initialize Tesseract for language '{}': {}",
                language, e
            ))
        })?;

        // Single-column page segmentation: recipe photos are assumed to be
        // one column of text top to bottom
        tess.set_variable(
            leptess::Variable::TesseditPagesegMode,
            self.page_seg_mode.as_str(),
        )
        .map_err(|e| {
            RecognitionError::Initialization(format!("failed to set page segmentation mode: {}", e))
        })?;

        if let Some(whitelist) = &self.character_whitelist {
            tess.set_variable(leptess::Variable::TesseditCharWhitelist, whitelist)
                .map_err(|e| {
                    RecognitionError::Initialization(format!(
                        "failed to set character whitelist: {}",
                        e
                    ))
                })?;
        }

        let instance = Arc::new(Mutex::new(tess));

        let mut instances = self.instances.lock();
        instances.insert(language.to_string(), Arc::clone(&instance));

        Ok(instance)
    }

    /// Resolve the tessdata directory: an explicitly configured path wins,
    /// otherwise well-known locations are probed, otherwise Tesseract's own
    /// default lookup applies.
    fn resolve_tessdata_path(configured: Option<&str>) -> Option<String> {
        if let Some(path) = configured {
            return Some(path.to_string());
        }

        for path in TESSDATA_LOCATIONS {
            if std::path::Path::new(path).is_dir() {
                return Some(path.to_string());
            }
        }

        None
    }

    /// Number of currently pooled instances
    pub fn pooled_instance_count(&self) -> usize {
        self.instances.lock().len()
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
    ) -> Result<EngineText, RecognitionError> {
        let instance = self.instance_for(language)?;

        // Hand the prepared image over in memory as PNG; no temp files
        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .map_err(|e| {
                RecognitionError::ImageHandoff(format!("failed to encode image for engine: {}", e))
            })?;

        let mut tess = instance.lock();

        tess.set_image_from_mem(&encoded).map_err(|e| {
            RecognitionError::ImageHandoff(format!("engine rejected image buffer: {}", e))
        })?;

        let text = tess
            .get_utf8_text()
            .map_err(|e| RecognitionError::Extraction(format!("text extraction failed: {}", e)))?;

        // Tesseract reports mean confidence as 0-100, negative when unknown
        let mean_conf = tess.mean_text_conf();
        let confidence = if mean_conf >= 0 {
            Some((mean_conf as f32 / 100.0).clamp(0.0, 1.0))
        } else {
            None
        };

        Ok(EngineText { text, confidence })
    }
}
