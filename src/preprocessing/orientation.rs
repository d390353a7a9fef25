//! # Page Orientation Module
//!
//! This module provides quarter-turn orientation detection and correction.
//! Printed text lines produce a strongly uneven horizontal projection profile
//! when the page is upright; comparing row-sum variance against column-sum
//! variance reveals whether the text runs horizontally or vertically. The
//! step fails open: a weak or absent hypothesis leaves the image unrotated.

use image::{imageops, GrayImage};
use tracing;

use super::types::{OrientationResult, PreprocessError};

/// Minimum confidence before a quarter-turn rotation is applied.
pub const ROTATION_CONFIDENCE_THRESHOLD: f32 = 0.65;

/// Longer-edge cap for the analysis copy; detection does not need full resolution.
const ANALYSIS_MAX_DIMENSION: u32 = 512;

/// Detects whether a page is quarter-turned and uprights it when confident.
///
/// The detection pass runs on a decimated copy of the image; the rotation,
/// when applied, is an exact lossless 90° turn of the full-size image.
/// The pass cannot distinguish a 90° from a 270° turn, nor detect an
/// upside-down page; those remain recognized-as-is (a known limitation of
/// projection analysis without engine-side script detection).
///
/// # Arguments
///
/// * `image` - The grayscale image to analyze
///
/// # Returns
///
/// Returns a `Result` containing the orientation result (image, hypothesis,
/// confidence, applied flag) or a `PreprocessError`
pub fn correct_orientation(image: &GrayImage) -> Result<OrientationResult, PreprocessError> {
    let start_time = std::time::Instant::now();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessError::ImageUnreadable {
            message: format!("cannot analyze orientation of an empty image ({}x{})", width, height),
        });
    }

    // Images too small to contain several text lines carry no usable signal
    if width < 32 || height < 32 {
        return Ok(OrientationResult {
            image: image.clone(),
            quarter_turns: 0,
            confidence: 0.0,
            applied: false,
            processing_time_ms: start_time.elapsed().as_millis() as u32,
        });
    }

    let analysis = decimate_for_analysis(image);
    let binary = threshold_at_mean(&analysis);
    let (row_variance, col_variance) = projection_variances(&binary);

    let total = row_variance + col_variance;
    if total <= f32::EPSILON {
        // No text-like structure either way; leave unrotated
        return Ok(OrientationResult {
            image: image.clone(),
            quarter_turns: 0,
            confidence: 0.0,
            applied: false,
            processing_time_ms: start_time.elapsed().as_millis() as u32,
        });
    }

    let quarter_turn_confidence = col_variance / total;

    if quarter_turn_confidence >= ROTATION_CONFIDENCE_THRESHOLD {
        let rotated = imageops::rotate90(image);
        let processing_time = start_time.elapsed();

        tracing::debug!(
            target: "ocr_preprocessing",
            "Orientation correction applied in {:.2}ms: quarter turn, confidence {:.3}",
            processing_time.as_millis(),
            quarter_turn_confidence
        );

        return Ok(OrientationResult {
            image: rotated,
            quarter_turns: 1,
            confidence: quarter_turn_confidence,
            applied: true,
            processing_time_ms: processing_time.as_millis() as u32,
        });
    }

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Orientation left unchanged in {:.2}ms: upright confidence {:.3}",
        processing_time.as_millis(),
        1.0 - quarter_turn_confidence
    );

    Ok(OrientationResult {
        image: image.clone(),
        quarter_turns: 0,
        confidence: 1.0 - quarter_turn_confidence,
        applied: false,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Shrinks the image for analysis when its longer edge exceeds the cap.
fn decimate_for_analysis(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let longer_edge = width.max(height);

    if longer_edge <= ANALYSIS_MAX_DIMENSION {
        return image.clone();
    }

    let factor = ANALYSIS_MAX_DIMENSION as f32 / longer_edge as f32;
    let new_width = ((width as f32 * factor).round() as u32).max(1);
    let new_height = ((height as f32 * factor).round() as u32).max(1);
    imageops::resize(image, new_width, new_height, imageops::FilterType::Triangle)
}

/// Binarizes at the mean intensity; pixels darker than the mean count as text.
fn threshold_at_mean(image: &GrayImage) -> GrayImage {
    let total: u64 = image.pixels().map(|p| p[0] as u64).sum();
    let count = (image.width() as u64 * image.height() as u64).max(1);
    let mean = (total / count) as u8;

    let mut binary = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel[0] < mean { 0u8 } else { 255u8 };
        binary.put_pixel(x, y, image::Luma([value]));
    }
    binary
}

/// Computes the variance of dark-pixel counts per row and per column.
///
/// High row variance means horizontal text lines (upright page); high column
/// variance means the text runs vertically (quarter-turned page).
fn projection_variances(binary: &GrayImage) -> (f32, f32) {
    let (width, height) = binary.dimensions();
    let mut row_counts = vec![0u32; height as usize];
    let mut col_counts = vec![0u32; width as usize];

    for (x, y, pixel) in binary.enumerate_pixels() {
        if pixel[0] == 0 {
            row_counts[y as usize] += 1;
            col_counts[x as usize] += 1;
        }
    }

    (variance(&row_counts), variance(&col_counts))
}

fn variance(counts: &[u32]) -> f32 {
    if counts.is_empty() {
        return 0.0;
    }
    let mean: f32 = counts.iter().map(|&c| c as f32).sum::<f32>() / counts.len() as f32;
    counts
        .iter()
        .map(|&c| (c as f32 - mean).powi(2))
        .sum::<f32>()
        / counts.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_horizontal_lines_image(width: u32, height: u32, line_spacing: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, image::Luma([255]));
        for y in (0..height).step_by(line_spacing as usize) {
            for x in 0..width {
                img.put_pixel(x, y, image::Luma([0]));
            }
        }
        img
    }

    fn create_vertical_lines_image(width: u32, height: u32, line_spacing: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, image::Luma([255]));
        for x in (0..width).step_by(line_spacing as usize) {
            for y in 0..height {
                img.put_pixel(x, y, image::Luma([0]));
            }
        }
        img
    }

    #[test]
    fn test_horizontal_lines_stay_unrotated() {
        let img = create_horizontal_lines_image(200, 200, 10);
        let result = correct_orientation(&img).unwrap();

        assert_eq!(result.quarter_turns, 0);
        assert!(!result.applied);
        assert!(result.confidence > 0.5);
        assert_eq!(result.image.dimensions(), (200, 200));
    }

    #[test]
    fn test_vertical_lines_trigger_quarter_turn() {
        let img = create_vertical_lines_image(200, 150, 10);
        let result = correct_orientation(&img).unwrap();

        assert_eq!(result.quarter_turns, 1);
        assert!(result.applied);
        assert!(result.confidence >= ROTATION_CONFIDENCE_THRESHOLD);
        // Quarter turn swaps the dimensions
        assert_eq!(result.image.dimensions(), (150, 200));
    }

    #[test]
    fn test_uniform_image_no_ops_with_zero_confidence() {
        let img = GrayImage::from_pixel(100, 100, image::Luma([128]));
        let result = correct_orientation(&img).unwrap();

        assert_eq!(result.quarter_turns, 0);
        assert!(!result.applied);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.image.dimensions(), (100, 100));
    }

    #[test]
    fn test_tiny_image_skips_analysis() {
        let img = GrayImage::from_pixel(16, 16, image::Luma([0]));
        let result = correct_orientation(&img).unwrap();

        assert!(!result.applied);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_large_image_analysis_is_decimated() {
        // Structure survives decimation: widely spaced vertical bars
        let img = create_vertical_lines_image(1600, 1200, 40);
        let result = correct_orientation(&img).unwrap();

        assert_eq!(result.quarter_turns, 1);
        assert!(result.applied);
        assert_eq!(result.image.dimensions(), (1200, 1600));
    }

    #[test]
    fn test_projection_variances_distinguish_directions() {
        let horizontal = create_horizontal_lines_image(100, 100, 10);
        let binary = threshold_at_mean(&horizontal);
        let (rows, cols) = projection_variances(&binary);
        assert!(rows > cols);

        let vertical = create_vertical_lines_image(100, 100, 10);
        let binary = threshold_at_mean(&vertical);
        let (rows, cols) = projection_variances(&binary);
        assert!(cols > rows);
    }
}
