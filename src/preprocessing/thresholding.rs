//! # Image Thresholding Module
//!
//! This module provides adaptive local thresholding so printed text stays
//! dark-on-light despite uneven lighting or paper texture. Local mean
//! comparison handles shadows and gradients a single global threshold cannot.
//! A dark-ratio guard rejects over-binarized results and falls back to the
//! unthresholded grayscale image.

use image::GrayImage;
use imageproc::contrast::{adaptive_threshold, otsu_level};
use tracing;

use super::types::{PreprocessError, ThresholdResult};

/// Radius of the local-mean window used for adaptive thresholding.
pub const ADAPTIVE_BLOCK_RADIUS: u32 = 16;

/// Plausible dark-pixel band for a binarized page of printed text.
/// Below the band the text was washed out; above it the page turned black.
pub const MIN_DARK_RATIO: f32 = 0.01;
pub const MAX_DARK_RATIO: f32 = 0.60;

/// Binarizes an image with adaptive local thresholding, guarded against
/// over-binarization.
///
/// Each pixel is compared against the mean of its surrounding block, which
/// keeps text legible under shadows and gradients where a global threshold
/// fails. When the dark-pixel ratio of the result falls outside the plausible
/// band for printed text, the input image is returned instead with
/// `applied == false` so recognition still sees usable content.
///
/// # Arguments
///
/// * `image` - The grayscale image to binarize
///
/// # Returns
///
/// Returns a `Result` containing the threshold result (binary or reverted
/// image, Otsu level, dark ratio, applied flag) or a `PreprocessError`
pub fn binarize_adaptive(image: &GrayImage) -> Result<ThresholdResult, PreprocessError> {
    let start_time = std::time::Instant::now();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessError::ImageUnreadable {
            message: format!("cannot threshold an empty image ({}x{})", width, height),
        });
    }

    // Global Otsu level of the input, reported for diagnostics
    let otsu = otsu_level(image);

    let binary = adaptive_threshold(image, ADAPTIVE_BLOCK_RADIUS);

    let dark_pixels = binary.pixels().filter(|p| p[0] == 0).count();
    let total_pixels = (width as u64 * height as u64) as f32;
    let dark_ratio = dark_pixels as f32 / total_pixels;

    let processing_time = start_time.elapsed();

    if !(MIN_DARK_RATIO..=MAX_DARK_RATIO).contains(&dark_ratio) {
        tracing::debug!(
            target: "ocr_preprocessing",
            "Adaptive threshold rejected in {:.2}ms: dark ratio {:.4} outside [{}, {}], keeping grayscale",
            processing_time.as_millis(),
            dark_ratio,
            MIN_DARK_RATIO,
            MAX_DARK_RATIO
        );

        return Ok(ThresholdResult {
            image: image.clone(),
            otsu_level: otsu,
            dark_ratio,
            applied: false,
            processing_time_ms: processing_time.as_millis() as u32,
        });
    }

    tracing::debug!(
        target: "ocr_preprocessing",
        "Adaptive threshold applied in {:.2}ms: otsu={}, dark ratio {:.4}, dimensions={}x{}",
        processing_time.as_millis(),
        otsu,
        dark_ratio,
        width,
        height
    );

    Ok(ThresholdResult {
        image: binary,
        otsu_level: otsu,
        dark_ratio,
        applied: true,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_text_like_image(width: u32, height: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, image::Luma([220]));
        // Dark strokes every few rows, resembling lines of print
        for y in (4..height).step_by(8) {
            for x in 4..width.saturating_sub(4) {
                img.put_pixel(x, y, image::Luma([30]));
                if y + 1 < height {
                    img.put_pixel(x, y + 1, image::Luma([40]));
                }
            }
        }
        img
    }

    #[test]
    fn test_text_like_image_is_binarized() {
        let img = create_text_like_image(120, 80);
        let result = binarize_adaptive(&img).unwrap();

        assert!(result.applied);
        assert!(result.dark_ratio >= MIN_DARK_RATIO && result.dark_ratio <= MAX_DARK_RATIO);

        // Result must be binary
        for pixel in result.image.pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
    }

    #[test]
    fn test_uniform_image_reverts_to_grayscale() {
        let img = GrayImage::from_pixel(64, 64, image::Luma([180]));
        let result = binarize_adaptive(&img).unwrap();

        assert!(!result.applied);
        // The original image is carried forward unchanged
        assert_eq!(result.image.get_pixel(10, 10)[0], 180);
    }

    #[test]
    fn test_dark_ratio_reported() {
        let img = create_text_like_image(100, 100);
        let result = binarize_adaptive(&img).unwrap();

        assert!(result.dark_ratio > 0.0);
        assert!(result.dark_ratio < 1.0);
    }

    #[test]
    fn test_otsu_level_separates_bimodal_image() {
        let mut img = GrayImage::new(10, 10);
        for (x, _y, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x < 5 {
                image::Luma([25])
            } else {
                image::Luma([225])
            };
        }

        let result = binarize_adaptive(&img).unwrap();
        assert!(result.otsu_level > 25 && result.otsu_level < 225);
    }
}
