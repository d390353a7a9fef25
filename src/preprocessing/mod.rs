//! # Image Preprocessing Module
//!
//! This module prepares uploaded recipe photos for text recognition. The
//! pipeline runs a fixed sequence of conservative steps:
//!
//! 1. Grayscale conversion
//! 2. Orientation correction for sideways photos
//! 3. Downscaling to bound the longer edge (never upscaling)
//! 4. Optional noise reduction and adaptive binarization
//!
//! Every step is fail-open: a step that cannot improve the image passes it
//! through unchanged and reports what happened in the result summary, so a
//! difficult photo still reaches the recognition engine.

pub mod filtering;
pub mod orientation;
pub mod scaling;
pub mod thresholding;
pub mod types;

pub use filtering::reduce_noise;
pub use orientation::{correct_orientation, ROTATION_CONFIDENCE_THRESHOLD};
pub use scaling::bound_dimensions;
pub use thresholding::{binarize_adaptive, ADAPTIVE_BLOCK_RADIUS};
pub use types::{
    BoundedImageResult, DenoisedImageResult, OrientationOutcome, OrientationResult,
    PreparedImage, PreprocessError, ThresholdOutcome, ThresholdResult,
};

use image::DynamicImage;
use tracing;

use crate::config::ExtractionConfig;

/// Gaussian sigma used for noise reduction ahead of binarization.
const NOISE_SIGMA: f32 = 1.0;

/// Runs the full preprocessing pipeline on a decoded upload.
///
/// The steps are applied in a fixed order and each one degrades gracefully:
/// orientation correction only rotates confident detections, downscaling
/// leaves small images alone, and binarization reverts to grayscale when it
/// would wash out or blacken the page. The returned `PreparedImage` carries
/// the final image together with a summary of every decision taken.
///
/// # Arguments
///
/// * `image` - The decoded upload in any supported color format
/// * `config` - Extraction settings controlling dimension bound and thresholding
///
/// # Returns
///
/// Returns a `Result` containing the prepared image or a `PreprocessError`
pub fn prepare_image(
    image: &DynamicImage,
    config: &ExtractionConfig,
) -> Result<PreparedImage, PreprocessError> {
    let start_time = std::time::Instant::now();

    let gray = image.to_luma8();
    let original_dimensions = gray.dimensions();

    let orientation_result = correct_orientation(&gray)?;
    let orientation = OrientationOutcome {
        quarter_turns: orientation_result.quarter_turns,
        confidence: orientation_result.confidence,
        applied: orientation_result.applied,
    };

    let bounded = bound_dimensions(&orientation_result.image, config.max_image_dimension)?;
    let final_dimensions = bounded.new_dimensions;
    let scale_factor = bounded.scale_factor;

    let (prepared, thresholding) = if config.adaptive_thresholding {
        let denoised = reduce_noise(&bounded.image, NOISE_SIGMA)?;
        let threshold_result = binarize_adaptive(&denoised.image)?;
        let outcome = ThresholdOutcome {
            enabled: true,
            applied: threshold_result.applied,
            otsu_level: Some(threshold_result.otsu_level),
            dark_ratio: Some(threshold_result.dark_ratio),
        };
        (threshold_result.image, outcome)
    } else {
        (bounded.image, ThresholdOutcome::skipped())
    };

    let processing_time = start_time.elapsed();

    tracing::info!(
        target: "ocr_preprocessing",
        original_dimensions = ?original_dimensions,
        final_dimensions = ?final_dimensions,
        scale_factor = scale_factor,
        rotated = orientation.applied,
        binarized = thresholding.applied,
        duration_ms = processing_time.as_millis() as u64,
        "Image preprocessing completed"
    );

    Ok(PreparedImage {
        image: prepared,
        original_dimensions,
        final_dimensions,
        scale_factor,
        orientation,
        thresholding,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}
