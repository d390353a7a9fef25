//! # Text Recognition Module
//!
//! This module wraps the external text-recognition engine behind a narrow
//! adapter boundary. It does not implement recognition itself; it shapes the
//! engine's raw output into an ordered `RecognizedText` value the field
//! parser can consume.
//!
//! ## Responsibilities
//!
//! - `RecognitionEngine` trait so the pipeline is testable with a fake engine
//! - Single-shot, cancelable invocation with a timeout
//! - Whitespace normalization and empty-line removal
//! - Correction of digit artifacts the engine introduces around fractions
//! - A minimum-text gate so blank photos surface as "no text detected"
//! - A heuristic quality score over the recognized text

pub mod tesseract;

pub use tesseract::TesseractEngine;

use image::{DynamicImage, GrayImage};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::parser::units::contains_unit_token;

/// Minimum number of visible characters for recognition to count as text.
pub const MIN_VISIBLE_CHARS: usize = 10;

/// Errors surfaced by the recognition boundary
#[derive(Debug, Clone)]
pub enum RecognitionError {
    /// Engine instance creation failed
    Initialization(String),
    /// The prepared image could not be handed to the engine
    ImageHandoff(String),
    /// The engine ran but failed to produce text
    Extraction(String),
    /// Recognition exceeded the configured timeout
    Timeout(String),
    /// The engine produced no usable text
    NoText(String),
}

impl std::fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionError::Initialization(msg) => {
                write!(f, "[OCR_INIT] Recognition engine initialization failed: {}", msg)
            }
            RecognitionError::ImageHandoff(msg) => {
                write!(f, "[IMAGE_HANDOFF] Failed to pass image to recognition engine: {}", msg)
            }
            RecognitionError::Extraction(msg) => {
                write!(f, "[OCR_EXTRACT] Text recognition failed: {}", msg)
            }
            RecognitionError::Timeout(msg) => {
                write!(f, "[OCR_TIMEOUT] Text recognition timed out: {}", msg)
            }
            RecognitionError::NoText(msg) => {
                write!(f, "[NO_TEXT] No text detected in image: {}", msg)
            }
        }
    }
}

impl std::error::Error for RecognitionError {}

impl From<anyhow::Error> for RecognitionError {
    fn from(err: anyhow::Error) -> Self {
        RecognitionError::Extraction(err.to_string())
    }
}

/// Raw output of a recognition engine before normalization
#[derive(Debug, Clone)]
pub struct EngineText {
    /// Recognized text exactly as the engine reported it
    pub text: String,
    /// Engine-reported confidence over the whole page (0.0 to 1.0)
    pub confidence: Option<f32>,
}

/// One recognized line in top-to-bottom reading order
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedLine {
    /// Line text with whitespace runs collapsed
    pub text: String,
    /// Confidence for this line (0.0 to 1.0) when the engine reports one
    pub confidence: Option<f32>,
}

/// Normalized recognition result consumed by the field parser
#[derive(Debug, Clone)]
pub struct RecognizedText {
    /// Non-empty lines in the order the engine reported them
    pub lines: Vec<RecognizedLine>,
    /// Mean confidence over all lines carrying one
    pub mean_confidence: Option<f32>,
    /// Wall-clock recognition time in milliseconds
    pub processing_time_ms: u32,
}

impl RecognizedText {
    /// Build a result from normalized lines, deriving the mean confidence
    /// from the lines that carry one.
    pub fn from_lines(lines: Vec<RecognizedLine>, processing_time_ms: u32) -> Self {
        let confidences: Vec<f32> = lines.iter().filter_map(|line| line.confidence).collect();
        let mean_confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        };

        Self {
            lines,
            mean_confidence,
            processing_time_ms,
        }
    }

    /// Total count of non-whitespace characters across all lines
    pub fn visible_char_count(&self) -> usize {
        self.lines
            .iter()
            .map(|line| line.text.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }
}

/// External recognition engine treated as an opaque capability.
///
/// Implementations take a prepared image and a language selector and return
/// the recognized text. The production implementation wraps Tesseract; tests
/// substitute a scripted fake so the rest of the pipeline runs without a
/// real engine.
pub trait RecognitionEngine: Send + Sync {
    /// Short engine identifier used in logs
    fn name(&self) -> &str;

    /// Run recognition over the image with the given language model.
    ///
    /// This call may block for seconds on constrained hardware; callers go
    /// through `recognize_text` which offloads it and enforces a timeout.
    fn recognize(&self, image: &DynamicImage, language: &str)
        -> Result<EngineText, RecognitionError>;
}

lazy_static! {
    // "1 / 2" and "1/ 2" become "1/2"
    static ref SPLIT_FRACTION: Regex =
        Regex::new(r"(\d)\s*/\s*(\d)").expect("fraction rejoin pattern should be valid");
    // "1 , 5" and "1 ,5" become "1,5"
    static ref SPLIT_DECIMAL_COMMA: Regex =
        Regex::new(r"(\d)\s*,\s*(\d)").expect("decimal rejoin pattern should be valid");
}

/// Rejoins digit sequences the engine splits apart.
///
/// Recognition tends to insert spaces around the slash of an ASCII fraction
/// and around a decimal comma, which would break quantity parsing later.
pub fn correct_recognition_artifacts(text: &str) -> String {
    let rejoined = SPLIT_FRACTION.replace_all(text, "$1/$2");
    SPLIT_DECIMAL_COMMA.replace_all(&rejoined, "$1,$2").to_string()
}

/// Shapes raw engine output into a `RecognizedText` value.
///
/// Collapses whitespace runs inside lines, trims each line, drops lines with
/// zero visible characters, and keeps the engine's reported line order. The
/// engine's page confidence is carried onto each line. Fewer than
/// `MIN_VISIBLE_CHARS` visible characters in total counts as no text.
///
/// # Arguments
///
/// * `raw` - The engine output to normalize
/// * `processing_time_ms` - Measured recognition duration
///
/// # Returns
///
/// Returns a `Result` containing the normalized text or a `RecognitionError`
pub fn normalize_engine_text(
    raw: &EngineText,
    processing_time_ms: u32,
) -> Result<RecognizedText, RecognitionError> {
    let corrected = correct_recognition_artifacts(&raw.text);

    let lines: Vec<RecognizedLine> = corrected
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<&str>>().join(" "))
        .filter(|line| !line.is_empty())
        .map(|text| RecognizedLine {
            text,
            confidence: raw.confidence,
        })
        .collect();

    let recognized = RecognizedText::from_lines(lines, processing_time_ms);

    if recognized.visible_char_count() < MIN_VISIBLE_CHARS {
        return Err(RecognitionError::NoText(format!(
            "only {} visible characters recognized (minimum {})",
            recognized.visible_char_count(),
            MIN_VISIBLE_CHARS
        )));
    }

    Ok(recognized)
}

/// Runs the engine on a prepared image as a single-shot operation with a
/// timeout.
///
/// The engine call is moved to the blocking thread pool so the async caller
/// stays cancelable. On timeout the caller is released immediately and the
/// detached engine call finishes in the background with its result dropped.
/// There is no automatic retry; a failed recognition on one photo is
/// unlikely to succeed identically on a second attempt.
///
/// # Arguments
///
/// * `engine` - The recognition engine to invoke
/// * `image` - The preprocessed single-channel image
/// * `language` - Language selector for the engine's model
/// * `timeout` - Upper bound on recognition latency
///
/// # Returns
///
/// Returns a `Result` containing the normalized text or a `RecognitionError`
pub async fn recognize_text(
    engine: Arc<dyn RecognitionEngine>,
    image: GrayImage,
    language: &str,
    timeout: Duration,
) -> Result<RecognizedText, RecognitionError> {
    let start_time = std::time::Instant::now();
    let engine_name = engine.name().to_string();
    let language_owned = language.to_string();

    let task = tokio::task::spawn_blocking(move || {
        let dynamic = DynamicImage::ImageLuma8(image);
        engine.recognize(&dynamic, &language_owned)
    });

    let engine_text = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(join_error)) => {
            return Err(RecognitionError::Extraction(format!(
                "recognition task did not complete: {}",
                join_error
            )));
        }
        Err(_) => {
            return Err(RecognitionError::Timeout(format!(
                "recognition did not finish within {}s",
                timeout.as_secs()
            )));
        }
    };

    let duration = start_time.elapsed();
    let recognized = normalize_engine_text(&engine_text, duration.as_millis() as u32)?;

    info!(
        target: "ocr_recognition",
        engine = %engine_name,
        language = %language,
        lines = recognized.lines.len(),
        mean_confidence = ?recognized.mean_confidence,
        duration_ms = duration.as_millis() as u64,
        "Text recognition completed"
    );

    Ok(recognized)
}

/// Scores recognized text for recipe-likeness on a 0 to 100 scale.
///
/// The score rewards substance (length, words, lines) and recipe signals
/// (German letters, digits, measurement units, a plausible first line) and
/// penalizes symbol noise and fragmented single-character words. It feeds
/// the confidence level attached to the autofill response.
pub fn evaluate_text_quality(recognized: &RecognizedText) -> f32 {
    let text = recognized
        .lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<&str>>()
        .join("\n");

    if text.is_empty() {
        return 0.0;
    }

    let mut score = 0.0f32;

    score += (text.chars().count() as f32 / 10.0).min(30.0);

    let words: Vec<&str> = text.split_whitespace().collect();
    score += (words.len() as f32 * 2.0).min(40.0);

    score += (recognized.lines.len() as f32 * 3.0).min(30.0);

    if text.chars().any(|c| "äöüßÄÖÜ".contains(c)) {
        score += 20.0;
    }

    if text.chars().any(|c| c.is_ascii_digit()) {
        score += 10.0;
    }

    if words.iter().any(|word| contains_unit_token(word)) {
        score += 15.0;
    }

    if let Some(first) = recognized.lines.first() {
        let first_len = first.text.chars().count();
        if (5..=60).contains(&first_len) {
            score += 20.0;
        }
    }

    let special_chars = text
        .chars()
        .filter(|c| {
            !c.is_alphanumeric() && !c.is_whitespace() && !".,;:!?()-/½⅓⅔¼¾°'\"".contains(*c)
        })
        .count();
    score -= special_chars as f32 * 2.0;

    let fragment_words = words
        .iter()
        .filter(|word| word.chars().count() == 1 && !word.chars().all(|c| c.is_ascii_digit()))
        .count();
    score -= fragment_words as f32;

    score.clamp(0.0, 100.0)
}
