//! # Application Error Types
//!
//! This module defines common error types used throughout the rezept-scan crate.
//! It provides structured error handling for the extraction and scaling components.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Upload payload validation errors (format, size)
    Validation(String),
    /// Corrupt or undecodable image uploads; preprocessing cannot proceed
    ImageUnreadable(String),
    /// Recognition engine errors (initialization, extraction, timeout, no text)
    Recognition(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::ImageUnreadable(msg) => write!(f, "[IMAGE_UNREADABLE] {}", msg),
            AppError::Recognition(msg) => write!(f, "[RECOGNITION] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::recognition::RecognitionError> for AppError {
    fn from(err: crate::recognition::RecognitionError) -> Self {
        AppError::Recognition(err.to_string())
    }
}

impl From<crate::preprocessing::PreprocessError> for AppError {
    fn from(err: crate::preprocessing::PreprocessError) -> Self {
        AppError::ImageUnreadable(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the crate
pub mod error_logging {
    use tracing::{error, warn};

    /// Log upload validation errors with payload context
    pub fn log_validation_error(
        error: &impl std::fmt::Display,
        operation: &str,
        payload_size: Option<u64>,
        detected_format: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            payload_size_bytes = ?payload_size,
            detected_format = ?detected_format,
            "Upload validation failed"
        );
    }

    /// Log preprocessing errors with image context
    pub fn log_preprocessing_error(
        error: &impl std::fmt::Display,
        operation: &str,
        dimensions: Option<(u32, u32)>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            dimensions = ?dimensions,
            "Image preprocessing failed"
        );
    }

    /// Log recognition errors with engine and timing context
    pub fn log_recognition_error(
        error: &impl std::fmt::Display,
        operation: &str,
        engine: &str,
        language: &str,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            engine = %engine,
            language = %language,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "Text recognition failed"
        );
    }

    /// Log an extraction request that degraded to an empty draft instead of failing
    pub fn log_extraction_degraded(
        error: &impl std::fmt::Display,
        operation: &str,
        payload_size: Option<u64>,
    ) {
        warn!(
            error = %error,
            operation = %operation,
            payload_size_bytes = ?payload_size,
            "Extraction degraded to empty draft"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
