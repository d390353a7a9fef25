//! # Extraction Configuration Module
//!
//! This module defines the configuration surface for the extraction pipeline:
//! recognition language, image size bounds, thresholding behavior and the
//! recognition timeout. Values are supplied by the surrounding application at
//! startup, either programmatically or from environment variables.

use tracing::warn;

// Constants for extraction configuration
pub const DEFAULT_LANGUAGE: &str = "deu";
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 2048;
pub const DEFAULT_RECOGNITION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024; // 16MB request cap
pub const FORMAT_DETECTION_BUFFER_SIZE: usize = 32;
pub const MIN_FORMAT_BYTES: usize = 8;
pub const MAX_DECODED_PIXELS: u64 = 50_000_000; // decompression bomb guard

/// Page segmentation modes relevant to photographed recipe pages
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSegMode {
    /// Fully automatic page segmentation
    Auto = 3,
    /// Assume a single column of text (recipe cards and cookbook pages)
    #[default]
    SingleColumn = 4,
    /// Assume a single uniform block of text
    SingleBlock = 6,
    /// Find as much text as possible in no particular order
    SparseText = 11,
}

impl PageSegMode {
    /// Convert PSM mode to the string value Tesseract expects
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SparseText => "11",
        }
    }
}

/// Configuration for the recipe extraction pipeline
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Recognition language code (e.g., "deu", "deu+eng")
    pub language: String,
    /// Maximum longer-edge dimension; larger images are downscaled, smaller never upscaled
    pub max_image_dimension: u32,
    /// Whether adaptive thresholding runs during preprocessing
    pub adaptive_thresholding: bool,
    /// Timeout for a single recognition pass in seconds
    pub recognition_timeout_secs: u64,
    /// Tessdata directory; when unset, known system locations are probed
    pub tessdata_path: Option<String>,
    /// Maximum accepted upload payload size in bytes
    pub max_upload_bytes: u64,
    /// Page segmentation mode handed to the engine
    pub page_seg_mode: PageSegMode,
    /// Character whitelist to restrict recognition output; None leaves the engine unrestricted
    pub character_whitelist: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            adaptive_thresholding: true,
            recognition_timeout_secs: DEFAULT_RECOGNITION_TIMEOUT_SECS,
            tessdata_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            page_seg_mode: PageSegMode::default(),
            character_whitelist: None,
        }
    }
}

impl ExtractionConfig {
    /// Build a configuration from `RECIPE_OCR_*` environment variables.
    ///
    /// Unset variables keep their defaults. Malformed numeric or boolean
    /// values fall back to the default for that field with a warning rather
    /// than failing startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(language) = std::env::var("RECIPE_OCR_LANGUAGE") {
            if !language.trim().is_empty() {
                config.language = language.trim().to_string();
            }
        }

        if let Some(dimension) =
            parse_env_var::<u32>("RECIPE_OCR_MAX_DIMENSION", config.max_image_dimension)
        {
            config.max_image_dimension = dimension;
        }

        if let Ok(flag) = std::env::var("RECIPE_OCR_ADAPTIVE_THRESHOLD") {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.adaptive_thresholding = true,
                "0" | "false" | "no" | "off" => config.adaptive_thresholding = false,
                other => {
                    warn!(
                        value = %other,
                        "Unrecognized RECIPE_OCR_ADAPTIVE_THRESHOLD value, keeping default"
                    );
                }
            }
        }

        if let Some(timeout) =
            parse_env_var::<u64>("RECIPE_OCR_TIMEOUT_SECS", config.recognition_timeout_secs)
        {
            config.recognition_timeout_secs = timeout;
        }

        if let Ok(path) = std::env::var("RECIPE_OCR_TESSDATA") {
            if !path.trim().is_empty() {
                config.tessdata_path = Some(path.trim().to_string());
            }
        }

        if let Some(max_bytes) =
            parse_env_var::<u64>("RECIPE_OCR_MAX_UPLOAD_BYTES", config.max_upload_bytes)
        {
            config.max_upload_bytes = max_bytes;
        }

        config
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        if self.language.trim().is_empty() {
            return Err(crate::errors::AppError::Config(
                "language cannot be empty".to_string(),
            ));
        }
        if !self
            .language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '_')
        {
            return Err(crate::errors::AppError::Config(format!(
                "language '{}' contains invalid characters",
                self.language
            )));
        }
        if !(256..=8192).contains(&self.max_image_dimension) {
            return Err(crate::errors::AppError::Config(format!(
                "max_image_dimension ({}) must be between 256 and 8192",
                self.max_image_dimension
            )));
        }
        if !(1..=300).contains(&self.recognition_timeout_secs) {
            return Err(crate::errors::AppError::Config(format!(
                "recognition_timeout_secs ({}) must be between 1 and 300",
                self.recognition_timeout_secs
            )));
        }
        if self.max_upload_bytes < 1024 {
            return Err(crate::errors::AppError::Config(format!(
                "max_upload_bytes ({}) must be at least 1024",
                self.max_upload_bytes
            )));
        }
        if let Some(path) = &self.tessdata_path {
            if !std::path::Path::new(path).is_dir() {
                return Err(crate::errors::AppError::Config(format!(
                    "tessdata_path '{}' is not a directory",
                    path
                )));
            }
        }
        Ok(())
    }
}

/// Parse a numeric environment variable, warning and returning None on malformed values
fn parse_env_var<T: std::str::FromStr>(name: &str, default: T) -> Option<T>
where
    T: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(
                    var = %name,
                    value = %raw,
                    default = %default,
                    "Malformed environment variable, keeping default"
                );
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.language, "deu");
        assert_eq!(config.max_image_dimension, 2048);
        assert!(config.adaptive_thresholding);
        assert_eq!(config.page_seg_mode, PageSegMode::SingleColumn);
    }

    #[test]
    #[allow(unused_assignments)]
    fn test_config_validation() {
        let mut config = ExtractionConfig::default();

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Test empty language
        config.language = "  ".to_string();
        assert!(config.validate().is_err());
        config.language = "deu".to_string();

        // Test language with invalid characters
        config.language = "deu; rm -rf".to_string();
        assert!(config.validate().is_err());
        config.language = "deu+eng".to_string();
        assert!(config.validate().is_ok());

        // Test out-of-range dimension
        config.max_image_dimension = 100;
        assert!(config.validate().is_err());
        config.max_image_dimension = 10000;
        assert!(config.validate().is_err());
        config.max_image_dimension = 2048;

        // Test out-of-range timeout
        config.recognition_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.recognition_timeout_secs = 301;
        assert!(config.validate().is_err());
        config.recognition_timeout_secs = 30;

        // Test undersized upload cap
        config.max_upload_bytes = 512;
        assert!(config.validate().is_err());
        config.max_upload_bytes = DEFAULT_MAX_UPLOAD_BYTES;

        // Test nonexistent tessdata directory
        config.tessdata_path = Some("/definitely/not/a/real/tessdata".to_string());
        assert!(config.validate().is_err());
        config.tessdata_path = None;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_page_seg_mode_as_str() {
        assert_eq!(PageSegMode::Auto.as_str(), "3");
        assert_eq!(PageSegMode::SingleColumn.as_str(), "4");
        assert_eq!(PageSegMode::SingleBlock.as_str(), "6");
        assert_eq!(PageSegMode::SparseText.as_str(), "11");
    }

    #[test]
    fn test_page_seg_mode_default_is_single_column() {
        assert_eq!(PageSegMode::default(), PageSegMode::SingleColumn);
    }
}
