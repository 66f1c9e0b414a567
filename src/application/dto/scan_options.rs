//! Scan options DTO

use crate::domain::repositories::TagSelector;
use crate::domain::services::classifier::{MAX_PROSE_TOKENS, MIN_CIPHER_LEN};
use crate::domain::services::{MAX_DIMENSION, TextClassifier};
use serde::{Deserialize, Serialize};

/// Elements whose text is considered for classification
pub const DEFAULT_TEXT_SELECTOR: &str = "p, span, div, pre, code, td, li, blockquote, a";

/// Options for scanning a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Longest side of any raster handed to the decoder
    pub max_dimension: u32,
    /// Images smaller than this on either side are never decoded
    pub min_image_side: u32,
    /// Text-bearing element selector
    pub text_selector: String,
    /// Minimum trimmed length for ciphertext candidates
    pub min_cipher_len: usize,
    /// Space-separated token count above which text counts as prose
    pub max_prose_tokens: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            min_image_side: 20,
            text_selector: DEFAULT_TEXT_SELECTOR.to_string(),
            min_cipher_len: MIN_CIPHER_LEN,
            max_prose_tokens: MAX_PROSE_TOKENS,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the raster clamp
    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = max.max(1);
        self
    }

    /// Sets the minimum decodable image side
    pub fn with_min_image_side(mut self, side: u32) -> Self {
        self.min_image_side = side;
        self
    }

    /// Sets the text-bearing element selector
    pub fn with_text_selector(mut self, selector: &str) -> Self {
        self.text_selector = selector.to_string();
        self
    }

    /// Sets the ciphertext classifier thresholds
    pub fn with_cipher_thresholds(mut self, min_len: usize, max_prose_tokens: usize) -> Self {
        self.min_cipher_len = min_len;
        self.max_prose_tokens = max_prose_tokens;
        self
    }

    pub fn selector(&self) -> TagSelector {
        TagSelector::parse(&self.text_selector)
    }

    /// Classifier shared by the scanner and the crypto panel
    pub fn classifier(&self) -> TextClassifier {
        TextClassifier::new(self.min_cipher_len, self.max_prose_tokens)
    }
}
