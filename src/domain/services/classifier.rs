//! Ciphertext text classifier
//!
//! Cheap heuristic pre-filter over arbitrary page text. It only nominates
//! candidates; a successful decrypt is the real confirmation.

/// Minimum trimmed length before text is considered
pub const MIN_CIPHER_LEN: usize = 40;

/// Space-separated token count above which text is treated as prose
pub const MAX_PROSE_TOKENS: usize = 3;

/// Heuristic classifier for base64-looking ciphertext
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextClassifier {
    min_len: usize,
    max_tokens: usize,
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self {
            min_len: MIN_CIPHER_LEN,
            max_tokens: MAX_PROSE_TOKENS,
        }
    }
}

impl TextClassifier {
    /// Creates a classifier with custom thresholds
    pub fn new(min_len: usize, max_tokens: usize) -> Self {
        Self {
            min_len,
            max_tokens,
        }
    }

    /// Returns whether `text` is a probable ciphertext block
    pub fn looks_like_ciphertext(&self, text: &str) -> bool {
        let trimmed = text.trim();

        if trimmed.chars().count() < self.min_len {
            return false;
        }

        if trimmed.contains(' ') && trimmed.split(' ').count() > self.max_tokens {
            return false;
        }

        is_base64_block(trimmed)
    }
}

/// Classifies with the default thresholds
pub fn looks_like_ciphertext(text: &str) -> bool {
    TextClassifier::default().looks_like_ciphertext(text)
}

/// Base64 alphabet with embedded line breaks, `=` padding only at the end
fn is_base64_block(text: &str) -> bool {
    let body = text.trim_end_matches('=');
    !body.is_empty()
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'\n' | b'\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_boundary() {
        let short = "A".repeat(39);
        let exact = "A".repeat(40);
        assert!(!looks_like_ciphertext(&short));
        assert!(looks_like_ciphertext(&exact));
    }

    #[test]
    fn test_rejects_prose() {
        assert!(!looks_like_ciphertext(
            "The quick brown fox jumps over the lazy dog and then some more words"
        ));
    }

    #[test]
    fn test_padding_only_at_end() {
        let padded = format!("{}==", "Qk".repeat(21));
        assert!(looks_like_ciphertext(&padded));
        let inner = format!("{}=={}", "Qk".repeat(11), "Qk".repeat(11));
        assert!(!looks_like_ciphertext(&inner));
        assert!(!looks_like_ciphertext(&"=".repeat(50)));
    }

    #[test]
    fn test_tolerates_line_breaks_and_surrounding_whitespace() {
        let wrapped = format!("  {}\n{}\r\n{}=  ", "a".repeat(20), "B".repeat(20), "9/+".repeat(3));
        assert!(looks_like_ciphertext(&wrapped));
    }

    #[test]
    fn test_few_spaced_tokens_still_fail_alphabet() {
        let text = format!("{} {}", "A".repeat(30), "B".repeat(30));
        assert!(!looks_like_ciphertext(&text));
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = TextClassifier::new(8, 3);
        assert!(classifier.looks_like_ciphertext("abcdEFGH"));
        assert!(!classifier.looks_like_ciphertext("abcdEFG"));
    }
}
