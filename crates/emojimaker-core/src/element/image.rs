//! Encoded image payloads carried by image elements.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors decoding an image payload.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("Not a data URL")]
    NotDataUrl,
    #[error("Data URL is not base64 encoded")]
    NotBase64,
    #[error("Invalid base64 data: {0}")]
    InvalidBase64(String),
    #[error("Unsupported image format")]
    UnsupportedFormat,
}

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// File extension used when exporting.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::WebP => "webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from a MIME type such as `image/png`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }
}

/// Decoded image bytes together with their format.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Wrap raw bytes, identifying the format from its magic bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PayloadError> {
        let format = ImageFormat::from_magic_bytes(&bytes).ok_or(PayloadError::UnsupportedFormat)?;
        Ok(Self { format, bytes })
    }

    /// Wrap raw bytes whose MIME type was reported by the platform
    /// (clipboard, file drop). Falls back to magic bytes for unknown types.
    pub fn from_bytes_with_mime(mime: &str, bytes: Vec<u8>) -> Result<Self, PayloadError> {
        let format = ImageFormat::from_mime_type(mime)
            .or_else(|| ImageFormat::from_magic_bytes(&bytes))
            .ok_or(PayloadError::UnsupportedFormat)?;
        Ok(Self { format, bytes })
    }

    /// Parse a `data:image/...;base64,...` URL.
    ///
    /// The declared MIME type wins; magic bytes are the fallback when it is
    /// missing or generic (`application/octet-stream`).
    pub fn from_data_url(url: &str) -> Result<Self, PayloadError> {
        let rest = url.trim().strip_prefix("data:").ok_or(PayloadError::NotDataUrl)?;
        let (header, data) = rest.split_once(',').ok_or(PayloadError::NotDataUrl)?;
        let mime = header.strip_suffix(";base64").ok_or(PayloadError::NotBase64)?;

        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| PayloadError::InvalidBase64(e.to_string()))?;

        let format = ImageFormat::from_mime_type(mime)
            .or_else(|| ImageFormat::from_magic_bytes(&bytes))
            .ok_or(PayloadError::UnsupportedFormat)?;

        Ok(Self { format, bytes })
    }

    /// Encode as a base64 data URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}
