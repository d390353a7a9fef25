//! # Upload Payload Validation
//!
//! This module guards the upload boundary: it inspects a raw payload's
//! leading bytes to identify the image format and rejects anything that is
//! not a JPEG or PNG of acceptable size before any decoding work happens.
//! A routing layer can call this directly to answer bad uploads with a
//! client error instead of attempting recognition.

use crate::config::{ExtractionConfig, FORMAT_DETECTION_BUFFER_SIZE, MIN_FORMAT_BYTES};
use crate::errors::{AppError, AppResult};
use tracing::debug;

/// Validate an uploaded image payload and return its detected format.
///
/// Checks, in order: a minimum byte count for format sniffing, the
/// configured payload size cap, magic-byte format detection over the
/// leading bytes, and the JPEG/PNG allow-list.
///
/// # Arguments
///
/// * `payload` - Raw upload bytes
/// * `config` - Extraction configuration supplying the size cap
///
/// # Returns
///
/// The detected `image::ImageFormat` on success, `AppError::Validation`
/// otherwise.
pub fn validate_image_payload(
    payload: &[u8],
    config: &ExtractionConfig,
) -> AppResult<image::ImageFormat> {
    if payload.len() < MIN_FORMAT_BYTES {
        return Err(AppError::Validation(format!(
            "payload too small to identify an image format ({} bytes, need at least {})",
            payload.len(),
            MIN_FORMAT_BYTES
        )));
    }

    if payload.len() as u64 > config.max_upload_bytes {
        return Err(AppError::Validation(format!(
            "payload too large: {} bytes (cap is {} bytes)",
            payload.len(),
            config.max_upload_bytes
        )));
    }

    let sniff_len = payload.len().min(FORMAT_DETECTION_BUFFER_SIZE);
    let format = image::guess_format(&payload[..sniff_len]).map_err(|e| {
        AppError::Validation(format!("could not determine image format: {}", e))
    })?;

    match format {
        image::ImageFormat::Png | image::ImageFormat::Jpeg => {
            debug!(
                format = ?format,
                payload_size_bytes = payload.len(),
                "Accepted upload payload"
            );
            Ok(format)
        }
        other => Err(AppError::Validation(format!(
            "unsupported image format {:?}: only JPEG and PNG uploads are accepted",
            other
        ))),
    }
}

/// Reject decoded images whose pixel count would exhaust memory.
///
/// Runs after decoding, since the compressed payload size says little about
/// the decoded footprint.
pub fn validate_decoded_dimensions(width: u32, height: u32) -> AppResult<()> {
    if width == 0 || height == 0 {
        return Err(AppError::ImageUnreadable(format!(
            "decoded image has a zero dimension ({}x{})",
            width, height
        )));
    }

    let pixels = width as u64 * height as u64;
    if pixels > crate::config::MAX_DECODED_PIXELS {
        return Err(AppError::ImageUnreadable(format!(
            "decoded image too large: {}x{} ({} pixels, cap is {})",
            width,
            height,
            pixels,
            crate::config::MAX_DECODED_PIXELS
        )));
    }

    Ok(())
}
