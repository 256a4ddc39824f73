//! Input validation that runs before the recognition engine is called.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::{DocsiftError, Result};

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const JPEG_MIME_TYPE: &str = "image/jpeg";
pub const PNG_MIME_TYPE: &str = "image/png";
pub const TIFF_MIME_TYPE: &str = "image/tiff";
pub const BMP_MIME_TYPE: &str = "image/bmp";

/// Default ceiling on a single document payload: 50 MiB.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 50 * 1024 * 1024;

pub const SUPPORTED_MIME_TYPES: &[&str] = &[PDF_MIME_TYPE, JPEG_MIME_TYPE, PNG_MIME_TYPE, TIFF_MIME_TYPE, BMP_MIME_TYPE];

static MIME_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("image/jpg", JPEG_MIME_TYPE);
    m.insert("image/pjpeg", JPEG_MIME_TYPE);
    m.insert("image/tif", TIFF_MIME_TYPE);
    m.insert("image/x-tiff", TIFF_MIME_TYPE);
    m.insert("image/x-png", PNG_MIME_TYPE);
    m.insert("image/x-bmp", BMP_MIME_TYPE);
    m.insert("image/x-ms-bmp", BMP_MIME_TYPE);
    m.insert("application/x-pdf", PDF_MIME_TYPE);
    m
});

/// Validate a MIME type against the allow-list.
///
/// Parameters (`; charset=...`) are dropped, matching is case-insensitive,
/// and known aliases map to their canonical type.
///
/// # Errors
///
/// Returns `DocsiftError::UnsupportedFormat` if the type is not accepted.
pub fn validate_mime_type(mime_type: &str) -> Result<String> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if let Some(canonical) = MIME_ALIASES.get(essence.as_str()) {
        return Ok((*canonical).to_string());
    }

    if SUPPORTED_MIME_TYPES.contains(&essence.as_str()) {
        return Ok(essence);
    }

    Err(DocsiftError::UnsupportedFormat(mime_type.to_string()))
}

/// # Errors
///
/// Returns `DocsiftError::PayloadTooLarge` when `size` exceeds `limit`.
pub fn validate_payload_size(size: usize, limit: usize) -> Result<()> {
    if size > limit {
        return Err(DocsiftError::PayloadTooLarge { size, limit });
    }
    Ok(())
}
