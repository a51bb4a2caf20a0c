//! Multipart boundary resolution.

use super::lines;
use crate::model::headers::HeaderMap;
use crate::model::media::MediaType;

/// Minimum length of a boundary accepted by the heuristic scan.
const MIN_HEURISTIC_BOUNDARY: usize = 6;

/// The `boundary` parameter of a parsed media type, verbatim.
pub fn from_media_type(media_type: &MediaType) -> Option<&str> {
    media_type.param("boundary").filter(|b| !b.is_empty())
}

/// The parsed `Content-Type` of `headers`, if it is `multipart/*`.
fn declared_multipart(headers: &HeaderMap) -> Option<MediaType> {
    let media_type = MediaType::parse(headers.get("content-type")?).ok()?;
    media_type.is_multipart().then_some(media_type)
}

/// Guess the boundary from raw text: the first `--token` (or `--token--`)
/// line whose token passes [`is_valid_boundary`].
pub fn from_heuristic_scan(content: &str) -> Option<String> {
    lines(content)
        .filter(|line| line.starts_with("--") && line.len() > 2)
        .map(|line| {
            let token = &line[2..];
            token.strip_suffix("--").unwrap_or(token)
        })
        .find(|token| is_valid_boundary(token))
        .map(str::to_string)
}

/// Letters, digits, `_ - = .` only, at least six characters.
pub fn is_valid_boundary(token: &str) -> bool {
    token.len() >= MIN_HEURISTIC_BOUNDARY
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'=' | b'.'))
}

/// Header-declared boundary first, heuristic scan of `content` second.
///
/// Headers that declare `multipart/*` are authoritative: without a boundary
/// parameter the result is `None` and the text is not scanned.
pub fn resolve(declared: Option<&HeaderMap>, content: &str) -> Option<String> {
    match declared.and_then(declared_multipart) {
        Some(media_type) => from_media_type(&media_type).map(str::to_string),
        None => from_heuristic_scan(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_media_type() {
        let mt = MediaType::parse("multipart/mixed; boundary=\"==_abc 123\"").unwrap();
        assert_eq!(from_media_type(&mt), Some("==_abc 123"));
        let mt = MediaType::parse("multipart/mixed").unwrap();
        assert_eq!(from_media_type(&mt), None);
    }

    #[test]
    fn test_non_multipart_declaration_falls_back_to_scan() {
        let headers: HeaderMap = [("Content-Type", "text/plain; boundary=abcdef")]
            .into_iter()
            .collect();
        assert_eq!(resolve(Some(&headers), "no delimiters"), None);
        assert_eq!(resolve(Some(&headers), "--scanned123\r\n").as_deref(), Some("scanned123"));
    }

    #[test]
    fn test_heuristic_scan_finds_first_valid() {
        let content = "preamble\r\n--x\r\n--bad boundary here\r\n------=_Part_42.1\r\nbody\r\n";
        assert_eq!(from_heuristic_scan(content).as_deref(), Some("----=_Part_42.1"));
    }

    #[test]
    fn test_heuristic_scan_strips_closing_marker() {
        let content = "text\r\n--abcdef123--\r\n";
        assert_eq!(from_heuristic_scan(content).as_deref(), Some("abcdef123"));
    }

    #[test]
    fn test_heuristic_scan_none() {
        assert_eq!(from_heuristic_scan("no boundaries\r\n-- sig"), None);
        assert_eq!(from_heuristic_scan("--short"), None);
    }

    #[test]
    fn test_is_valid_boundary() {
        assert!(is_valid_boundary("abc_12"));
        assert!(!is_valid_boundary("abc12"));
        assert!(!is_valid_boundary("abc 123"));
        assert!(!is_valid_boundary("abc/123"));
    }

    #[test]
    fn test_declared_boundary_preferred() {
        let headers: HeaderMap = [("Content-Type", "multipart/alternative; boundary=declared1")]
            .into_iter()
            .collect();
        let content = "--scanned123\r\n";
        assert_eq!(resolve(Some(&headers), content).as_deref(), Some("declared1"));
        assert_eq!(resolve(None, content).as_deref(), Some("scanned123"));
    }

    #[test]
    fn test_declared_multipart_without_boundary_is_not_scanned() {
        let headers: HeaderMap = [("Content-Type", "multipart/mixed")].into_iter().collect();
        let content = "--scanned123\r\nContent-Type: text/plain\r\n\r\nhi\r\n--scanned123--";
        assert_eq!(resolve(Some(&headers), content), None);

        let single: HeaderMap = [("Content-Type", "text/plain")].into_iter().collect();
        assert_eq!(resolve(Some(&single), content).as_deref(), Some("scanned123"));
    }
}
