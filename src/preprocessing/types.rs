//! # Shared Types for Image Preprocessing
//!
//! This module contains the shared types, result structs, and errors used
//! across the preprocessing sub-modules.

use image::GrayImage;

/// Errors that can occur during image preprocessing operations.
#[derive(Debug, Clone)]
pub enum PreprocessError {
    /// Image could not be decoded or has no usable pixels
    ImageUnreadable { message: String },
    /// Invalid Gaussian blur sigma specified
    InvalidSigma { sigma: f32 },
    /// Image processing operation failed
    ProcessingFailed { message: String },
}

impl std::fmt::Display for PreprocessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessError::ImageUnreadable { message } => {
                write!(f, "Image unreadable: {}", message)
            }
            PreprocessError::InvalidSigma { sigma } => {
                write!(
                    f,
                    "Invalid blur sigma: {}. Must be greater than 0 and at most 5.0",
                    sigma
                )
            }
            PreprocessError::ProcessingFailed { message } => {
                write!(f, "Image processing failed: {}", message)
            }
        }
    }
}

impl std::error::Error for PreprocessError {}

/// Result of the bounded-resize operation.
#[derive(Debug, Clone)]
pub struct BoundedImageResult {
    /// The size-bounded image
    pub image: GrayImage,
    /// Original image dimensions (width, height)
    pub original_dimensions: (u32, u32),
    /// New image dimensions (width, height)
    pub new_dimensions: (u32, u32),
    /// Scale factor applied; 1.0 means the image passed through untouched
    pub scale_factor: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of the orientation-correction operation.
#[derive(Debug, Clone)]
pub struct OrientationResult {
    /// The orientation-corrected image (unchanged when no rotation applied)
    pub image: GrayImage,
    /// Clockwise quarter turns applied (0 or 1)
    pub quarter_turns: u32,
    /// Confidence in the orientation hypothesis (0.0-1.0)
    pub confidence: f32,
    /// Whether a rotation was actually applied
    pub applied: bool,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of image noise reduction.
#[derive(Debug, Clone)]
pub struct DenoisedImageResult {
    /// The denoised image
    pub image: GrayImage,
    /// Sigma value used for Gaussian blur
    pub sigma: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of adaptive thresholding.
#[derive(Debug, Clone)]
pub struct ThresholdResult {
    /// The binarized image, or the unmodified input when the guard rejected the result
    pub image: GrayImage,
    /// Global Otsu level of the input, for diagnostics
    pub otsu_level: u8,
    /// Fraction of dark pixels after thresholding (0.0-1.0)
    pub dark_ratio: f32,
    /// Whether the thresholded image was kept
    pub applied: bool,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Summary of the orientation step carried on a prepared image.
#[derive(Debug, Clone, Copy)]
pub struct OrientationOutcome {
    /// Clockwise quarter turns applied (0 or 1)
    pub quarter_turns: u32,
    /// Confidence in the orientation hypothesis (0.0-1.0)
    pub confidence: f32,
    /// Whether a rotation was actually applied
    pub applied: bool,
}

/// Summary of the thresholding step carried on a prepared image.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdOutcome {
    /// Whether thresholding was enabled by configuration
    pub enabled: bool,
    /// Whether the thresholded image was kept
    pub applied: bool,
    /// Global Otsu level of the pre-threshold image
    pub otsu_level: Option<u8>,
    /// Fraction of dark pixels after thresholding
    pub dark_ratio: Option<f32>,
}

impl ThresholdOutcome {
    /// Outcome for a pipeline run with thresholding disabled.
    pub fn skipped() -> Self {
        Self {
            enabled: false,
            applied: false,
            otsu_level: None,
            dark_ratio: None,
        }
    }
}

/// A fully preprocessed image ready for recognition, with step metadata.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Single-channel image handed to the recognition engine
    pub image: GrayImage,
    /// Dimensions of the decoded upload (width, height)
    pub original_dimensions: (u32, u32),
    /// Dimensions after orientation and resize (width, height)
    pub final_dimensions: (u32, u32),
    /// Downscale factor applied; 1.0 when no resize happened
    pub scale_factor: f32,
    /// Orientation step summary
    pub orientation: OrientationOutcome,
    /// Thresholding step summary
    pub thresholding: ThresholdOutcome,
    /// Total pipeline processing time in milliseconds
    pub processing_time_ms: u32,
}
