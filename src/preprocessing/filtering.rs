//! # Image Filtering Module
//!
//! This module provides Gaussian noise reduction for OCR preprocessing.
//! A light blur before thresholding suppresses sensor noise and paper grain
//! that would otherwise survive binarization as speckle.

use image::{imageops, GrayImage};
use tracing;

use super::types::{DenoisedImageResult, PreprocessError};

/// Applies Gaussian blur to reduce image noise while preserving text edges.
///
/// # Arguments
///
/// * `image` - The grayscale image to denoise
/// * `sigma` - Standard deviation for the Gaussian kernel (recommended: 1.0-1.5)
///
/// # Returns
///
/// Returns a `Result` containing the denoised image and metadata, or a
/// `PreprocessError` when sigma is outside (0.0, 5.0]
pub fn reduce_noise(image: &GrayImage, sigma: f32) -> Result<DenoisedImageResult, PreprocessError> {
    let start_time = std::time::Instant::now();

    if !sigma.is_finite() || sigma <= 0.0 || sigma > 5.0 {
        return Err(PreprocessError::InvalidSigma { sigma });
    }

    let blurred = imageops::blur(image, sigma);

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Noise reduction completed in {:.2}ms: sigma={:.2}, dimensions={}x{}",
        processing_time.as_millis(),
        sigma,
        blurred.width(),
        blurred.height()
    );

    Ok(DenoisedImageResult {
        image: blurred,
        sigma,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}
