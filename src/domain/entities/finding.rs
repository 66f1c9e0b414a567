//! Finding entities
//!
//! A finding is either a decoded QR payload or a block of page text that
//! looks like ciphertext. Both are immutable once recorded.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a fingerprint
const FINGERPRINT_BYTES: usize = 8;

/// A QR payload decoded from an image in the document
///
/// Identity is the `(payload, source_image_url)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrFinding {
    /// Decoded symbol content
    pub payload: String,
    /// `src` of the image the symbol was decoded from
    pub source_image_url: String,
}

impl QrFinding {
    /// Creates a new QR finding
    pub fn new(payload: impl Into<String>, source_image_url: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            source_image_url: source_image_url.into(),
        }
    }

    /// Returns a short, log-safe fingerprint of the payload
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.payload)
    }
}

/// A text block classified as probable ciphertext
///
/// Identity is the payload string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextFinding {
    /// Trimmed text content of the element
    pub payload: String,
}

impl TextFinding {
    /// Creates a new text finding
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Returns a short, log-safe fingerprint of the payload
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.payload)
    }
}

/// Hex-encoded truncated SHA-256 of a payload.
///
/// Payloads may be secrets, so logs carry this instead of the content.
pub fn fingerprint(payload: &str) -> String {
    let digest = Sha256::digest(payload.as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
