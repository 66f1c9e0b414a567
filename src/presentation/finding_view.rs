//! Finding presentation
//!
//! Per-finding hints shown by the control surface: whether the payload is a
//! link, and whether it is worth handing to the crypto panel.

use crate::domain::entities::{QrFinding, TextFinding};
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Minimum payload length before it can look encrypted
const MIN_ENCRYPTED_LEN: usize = 40;

/// Standard alphabet, padding optional
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Display model of one finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingView {
    pub payload: String,
    /// Image the payload came from; `None` for text findings
    pub source_image_url: Option<String>,
    /// Parses as an absolute URL
    pub is_url: bool,
    /// Decodes to at least one cipher envelope
    pub looks_encrypted: bool,
}

impl FindingView {
    pub fn from_qr(finding: &QrFinding, envelope_overhead: usize) -> Self {
        Self::build(&finding.payload, Some(finding.source_image_url.clone()), envelope_overhead)
    }

    pub fn from_text(finding: &TextFinding, envelope_overhead: usize) -> Self {
        Self::build(&finding.payload, None, envelope_overhead)
    }

    fn build(payload: &str, source_image_url: Option<String>, envelope_overhead: usize) -> Self {
        Self {
            payload: payload.to_string(),
            source_image_url,
            is_url: is_url(payload),
            looks_encrypted: looks_encrypted(payload, envelope_overhead),
        }
    }

    /// Text to hand off to the crypto panel, if any
    pub fn decrypt_handoff(&self) -> Option<String> {
        self.looks_encrypted.then(|| self.payload.clone())
    }
}

pub fn is_url(text: &str) -> bool {
    reqwest::Url::parse(text).is_ok()
}

/// Whether `text` base64-decodes to at least one cipher envelope
///
/// ASCII whitespace is ignored, so line-wrapped ciphertext still qualifies.
pub fn looks_encrypted(text: &str, envelope_overhead: usize) -> bool {
    if text.chars().count() < MIN_ENCRYPTED_LEN {
        return false;
    }
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT
        .decode(compact)
        .is_ok_and(|decoded| decoded.len() >= envelope_overhead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn test_url_detection() {
        assert!(is_url("https://example.com/path?q=1"));
        assert!(is_url("mailto:someone@example.com"));
        assert!(!is_url("hello-world"));
        assert!(!is_url("/relative/path"));
    }

    #[test]
    fn test_encrypted_detection() {
        let payload = STANDARD.encode([7u8; 60]);
        assert!(looks_encrypted(&payload, 44));
        assert!(!looks_encrypted(&payload, 61));
        assert!(!looks_encrypted("c2hvcnQ=", 0));
        assert!(!looks_encrypted(&"!".repeat(50), 0));
    }

    #[test]
    fn test_wrapped_and_unpadded_payloads() {
        let payload = STANDARD.encode([9u8; 50]);
        let wrapped = format!("{}\n{}\r\n", &payload[..40], &payload[40..]);
        assert!(looks_encrypted(&wrapped, 44));

        let unpadded = payload.trim_end_matches('=');
        assert_ne!(unpadded, payload);
        assert!(looks_encrypted(unpadded, 44));
    }

    #[test]
    fn test_handoff_only_for_encrypted() {
        let qr = QrFinding::new("https://example.com", "https://img/1.png");
        let view = FindingView::from_qr(&qr, 44);
        assert!(view.is_url);
        assert_eq!(view.decrypt_handoff(), None);

        let text = TextFinding::new(STANDARD.encode([1u8; 48]));
        let view = FindingView::from_text(&text, 44);
        assert_eq!(view.decrypt_handoff(), Some(text.payload.clone()));
    }
}
