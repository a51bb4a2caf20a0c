//! Header-less content classification.
//!
//! Upstream producers do not reliably label content, so these predicates pick
//! a decoding path. They never reject input.

use base64::Engine as _;

use super::lines;
use super::transfer::{strip_base64_whitespace, BASE64};

/// Whole blob is Base64: after dropping CR/LF/space it is non-empty, a
/// multiple of 4 long, drawn from `[A-Za-z0-9+/=]`, and actually decodes.
pub fn looks_like_base64(content: &str) -> bool {
    let clean = strip_base64_whitespace(content);

    if clean.is_empty() || clean.len() % 4 != 0 {
        return false;
    }
    if !clean.bytes().all(is_base64_byte) {
        return false;
    }
    BASE64.decode(&clean).is_ok()
}

fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')
}

/// Coarse multipart signal: some line starts with `--` and is longer than
/// 10 characters, and the text contains `Content-Type:` somewhere.
pub fn looks_like_mime(content: &str) -> bool {
    content.contains("Content-Type:")
        && lines(content).any(|line| line.starts_with("--") && line.len() > 10)
}

/// The gate for a structured parse of header-less content.
pub fn mentions_mime_headers(content: &str) -> bool {
    content.contains("Content-Type:") || content.contains("boundary=")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_detected() {
        assert!(looks_like_base64("SGVsbG8sIFdvcmxkIQ=="));
        assert!(looks_like_base64("SGVsbG8s\r\nIFdvcmxk\r\nIQ=="));
    }

    #[test]
    fn test_base64_rejects_wrong_length() {
        assert!(!looks_like_base64("SGVsbG8"));
        assert!(!looks_like_base64(""));
        assert!(!looks_like_base64(" \r\n "));
    }

    #[test]
    fn test_base64_rejects_foreign_characters() {
        assert!(!looks_like_base64("Hello, World"));
        assert!(!looks_like_base64("abc-def_ghi="));
        assert!(!looks_like_base64("ab\tc"));
    }

    #[test]
    fn test_base64_rejects_bad_padding() {
        // Right length and alphabet, but padding in the middle
        assert!(!looks_like_base64("ab=cdefg"));
        assert!(!looks_like_base64("===="));
    }

    #[test]
    fn test_short_word_is_a_known_false_positive() {
        // Four alphanumerics satisfy every check
        assert!(looks_like_base64("test"));
    }

    #[test]
    fn test_mime_detected() {
        let body = "--boundary12345\r\nContent-Type: text/plain\r\n\r\nhi\r\n--boundary12345--";
        assert!(looks_like_mime(body));
    }

    #[test]
    fn test_mime_requires_both_signals() {
        assert!(!looks_like_mime("--boundary12345\r\nno type here"));
        assert!(!looks_like_mime("Content-Type: text/plain\r\n--short"));
        assert!(!looks_like_mime("plain text"));
    }

    #[test]
    fn test_mentions_mime_headers() {
        assert!(mentions_mime_headers("x boundary=abc"));
        assert!(mentions_mime_headers("Content-Type: text/html"));
        assert!(!mentions_mime_headers("content-type lowercase prose"));
    }
}
