//! # Bounded Image Resize Module
//!
//! This module caps the longer edge of an image at a configured maximum so
//! recognition latency stays acceptable on constrained hardware. Images at or
//! below the bound pass through untouched; upscaling never happens.

use image::{imageops, GrayImage};
use tracing;

use super::types::{BoundedImageResult, PreprocessError};

/// Downscales an image proportionally when its longer edge exceeds the maximum.
///
/// Uses Lanczos3 resampling, which preserves stroke edges well enough for
/// printed text. An image already within the bound is returned unchanged with
/// `scale_factor == 1.0`.
///
/// # Arguments
///
/// * `image` - The grayscale image to bound
/// * `max_dimension` - Maximum allowed size of the longer edge in pixels
///
/// # Returns
///
/// Returns a `Result` containing the bounded image and scaling metadata,
/// or a `PreprocessError`
pub fn bound_dimensions(
    image: &GrayImage,
    max_dimension: u32,
) -> Result<BoundedImageResult, PreprocessError> {
    let start_time = std::time::Instant::now();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessError::ImageUnreadable {
            message: format!("cannot resize an empty image ({}x{})", width, height),
        });
    }
    if max_dimension == 0 {
        return Err(PreprocessError::ProcessingFailed {
            message: "max_dimension must be greater than 0".to_string(),
        });
    }

    let longer_edge = width.max(height);

    // Never upscale: below-limit images pass through with identical dimensions
    if longer_edge <= max_dimension {
        return Ok(BoundedImageResult {
            image: image.clone(),
            original_dimensions: (width, height),
            new_dimensions: (width, height),
            scale_factor: 1.0,
            processing_time_ms: start_time.elapsed().as_millis() as u32,
        });
    }

    let scale_factor = max_dimension as f32 / longer_edge as f32;
    let new_width = ((width as f32 * scale_factor).round() as u32).max(1);
    let new_height = ((height as f32 * scale_factor).round() as u32).max(1);

    let resized = imageops::resize(image, new_width, new_height, imageops::FilterType::Lanczos3);

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Bounded resize completed in {:.2}ms: {}x{} -> {}x{} (factor {:.3})",
        processing_time.as_millis(),
        width,
        height,
        new_width,
        new_height,
        scale_factor
    );

    Ok(BoundedImageResult {
        image: resized,
        original_dimensions: (width, height),
        new_dimensions: (new_width, new_height),
        scale_factor,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, image::Luma([200]))
    }

    #[test]
    fn test_below_limit_passes_through_unchanged() {
        let img = create_test_image(800, 600);
        let result = bound_dimensions(&img, 2048).unwrap();

        assert_eq!(result.new_dimensions, (800, 600));
        assert_eq!(result.original_dimensions, (800, 600));
        assert_eq!(result.scale_factor, 1.0);
    }

    #[test]
    fn test_exact_limit_passes_through_unchanged() {
        let img = create_test_image(2048, 1024);
        let result = bound_dimensions(&img, 2048).unwrap();

        assert_eq!(result.new_dimensions, (2048, 1024));
        assert_eq!(result.scale_factor, 1.0);
    }

    #[test]
    fn test_oversized_landscape_downscaled_proportionally() {
        let img = create_test_image(4000, 3000);
        let result = bound_dimensions(&img, 2000).unwrap();

        assert_eq!(result.new_dimensions, (2000, 1500));
        assert!((result.scale_factor - 0.5).abs() < 1e-6);
        assert_eq!(result.image.dimensions(), (2000, 1500));
    }

    #[test]
    fn test_oversized_portrait_downscaled_proportionally() {
        let img = create_test_image(1500, 3000);
        let result = bound_dimensions(&img, 1000).unwrap();

        assert_eq!(result.new_dimensions, (500, 1000));
        assert!((result.scale_factor - 1.0 / 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_extreme_aspect_ratio_never_collapses_to_zero() {
        let img = create_test_image(5000, 2);
        let result = bound_dimensions(&img, 1000).unwrap();

        assert_eq!(result.new_dimensions.0, 1000);
        assert!(result.new_dimensions.1 >= 1);
    }

    #[test]
    fn test_zero_max_dimension_rejected() {
        let img = create_test_image(100, 100);
        assert!(bound_dimensions(&img, 0).is_err());
    }
}
