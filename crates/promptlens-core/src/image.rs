//! Image payload validation and conversion.
//!
//! Uploads are validated here before any credits are reserved: format is
//! sniffed from magic bytes (the declared extension is not trusted) and the
//! payload size is capped. Data-URI round-tripping keeps a decodable local
//! preview available for regeneration when the uploaded blob is gone.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{PromptLensError, Result};

/// Maximum accepted upload size (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// Resolves a format from a MIME type string.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Sniffs the format from the payload's magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }
}

/// A validated image payload ready for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ImagePayload {
    /// Validates raw bytes into a payload.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when the format is not JPEG/PNG/WEBP or
    /// the payload exceeds [`MAX_IMAGE_BYTES`].
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(PromptLensError::validation("File too large (max 10MB)."));
        }
        let format = ImageFormat::sniff(&bytes).ok_or_else(|| {
            PromptLensError::validation("Unsupported file format. Use JPG/PNG/WEBP.")
        })?;
        Ok(Self { bytes, format })
    }

    /// Returns the raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the sniffed format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Returns the MIME type.
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    /// Encodes the payload as a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime(),
            BASE64_STANDARD.encode(&self.bytes)
        )
    }

    /// Decodes a `data:` URI back into a validated payload.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when the URI is malformed or the decoded
    /// bytes do not validate as a supported image.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| PromptLensError::validation("Not a data URI"))?;
        let (_, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| PromptLensError::validation("Data URI is not base64-encoded"))?;
        let bytes = BASE64_STANDARD
            .decode(payload)
            .map_err(|e| PromptLensError::validation(format!("Invalid base64 in data URI: {e}")))?;
        Self::from_bytes(bytes)
    }
}

/// Options for the compression collaborator.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 1200,
            quality: 0.85,
        }
    }
}

/// External image transform collaborator.
///
/// Both operations are pure from the coordinator's point of view; the
/// implementation is free to be a real codec or a passthrough.
pub trait ImageTransform: Send + Sync {
    /// Compresses an image before upload.
    fn compress(&self, image: &ImagePayload, opts: &CompressOptions) -> Result<ImagePayload>;

    /// Produces a small preview as a `data:` URI, bounded by `max_dim`.
    fn thumbnail(&self, image: &ImagePayload, max_dim: u32) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn jpeg_bytes() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(&[0u8; 64]);
        bytes
    }

    #[test]
    fn sniffs_known_formats() {
        assert_eq!(ImageFormat::sniff(&jpeg_bytes()), Some(ImageFormat::Jpeg));
        assert_eq!(
            ImageFormat::sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]),
            Some(ImageFormat::Png)
        );
        let mut webp = b"RIFF".to_vec();
        webp.extend_from_slice(&[0u8; 4]);
        webp.extend_from_slice(b"WEBP");
        assert_eq!(ImageFormat::sniff(&webp), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
    }

    #[test]
    fn rejects_oversized_payload() {
        let mut bytes = jpeg_bytes();
        bytes.resize(MAX_IMAGE_BYTES + 1, 0);
        let err = ImagePayload::from_bytes(bytes).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn rejects_unknown_format() {
        let err = ImagePayload::from_bytes(b"not an image".to_vec()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn data_uri_round_trip() {
        let payload = ImagePayload::from_bytes(jpeg_bytes()).unwrap();
        let uri = payload.to_data_uri();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        let decoded = ImagePayload::from_data_uri(&uri).unwrap();
        assert_eq!(decoded, payload);
    }
}
