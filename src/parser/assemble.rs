//! Turning multipart sections into `text_body` / `html_body`.

use tracing::debug;

use super::boundary;
use super::multipart::{MultipartSplitter, RawPart};
use super::transfer::decode_transfer;
use crate::error::Result;
use crate::model::content::{BodyKind, DecodedContent};
use crate::model::media::{MediaType, TransferEncoding};

/// How many `multipart/*` levels below the top one are descended into.
pub const MAX_NESTING: usize = 1;

/// Body slot a `Content-Type` value maps to, by substring match.
pub fn slot_for(media_type: &str) -> Option<BodyKind> {
    let media_type = media_type.to_ascii_lowercase();
    if media_type.contains("text/plain") {
        Some(BodyKind::Text)
    } else if media_type.contains("text/html") {
        Some(BodyKind::Html)
    } else {
        None
    }
}

/// Place a decoded part into its slot if that slot is still empty.
///
/// Returns the slot that was filled; parts of other media types, and parts
/// whose slot is already taken, are dropped.
pub fn assign(result: &mut DecodedContent, decoded_part: String, media_type: &str) -> Option<BodyKind> {
    let kind = slot_for(media_type)?;
    result.offer_body(kind, decoded_part).then_some(kind)
}

/// Split `content` on `boundary` and assemble every section into `result`.
///
/// Returns the number of sections read. Reading stops after `max_parts`
/// sections, or as soon as both slots are filled.
pub fn assemble_multipart(
    result: &mut DecodedContent,
    content: &str,
    boundary: &str,
    max_parts: usize,
) -> Result<usize> {
    assemble_at_depth(result, content, boundary, max_parts, 0)
}

fn assemble_at_depth(
    result: &mut DecodedContent,
    content: &str,
    boundary: &str,
    max_parts: usize,
    depth: usize,
) -> Result<usize> {
    let mut seen = 0;
    for part in MultipartSplitter::new(content, boundary)? {
        if seen >= max_parts {
            debug!(max_parts, "Part limit reached, ignoring remaining sections");
            break;
        }
        seen += 1;
        assemble_part(result, &part, max_parts, depth);
        if result.bodies_complete() {
            break;
        }
    }
    Ok(seen)
}

fn assemble_part(result: &mut DecodedContent, part: &RawPart, max_parts: usize, depth: usize) {
    if is_attachment(part) {
        return;
    }

    let media_type = part.headers.get("content-type").unwrap_or("");
    let encoding = TransferEncoding::from_optional(part.headers.get("content-transfer-encoding"));

    if let Some(inner_boundary) = nested_boundary(media_type) {
        if depth < MAX_NESTING {
            let inner = decode_transfer(&part.body, encoding);
            if let Err(e) = assemble_at_depth(result, &inner, &inner_boundary, max_parts, depth + 1) {
                debug!(error = %e, "Nested multipart skipped");
            }
        }
        return;
    }

    let decoded = decode_transfer(part.body.trim(), encoding);
    assign(result, decoded, media_type);
}

fn nested_boundary(media_type: &str) -> Option<String> {
    let media_type = MediaType::parse(media_type).ok()?;
    if !media_type.is_multipart() {
        return None;
    }
    boundary::from_media_type(&media_type).map(str::to_string)
}

fn is_attachment(part: &RawPart) -> bool {
    part.headers
        .get("content-disposition")
        .map(|d| d.to_ascii_lowercase().starts_with("attachment"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multipart(parts: &[(&str, &str, &str)]) -> String {
        let mut body = String::from("preamble\r\n");
        for (content_type, encoding, content) in parts {
            body.push_str("--b0undary\r\n");
            body.push_str(&format!("Content-Type: {content_type}\r\n"));
            if !encoding.is_empty() {
                body.push_str(&format!("Content-Transfer-Encoding: {encoding}\r\n"));
            }
            body.push_str("\r\n");
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str("--b0undary--\r\n");
        body
    }

    #[test]
    fn test_slot_for() {
        assert_eq!(slot_for("TEXT/PLAIN; charset=utf-8"), Some(BodyKind::Text));
        assert_eq!(slot_for("text/html"), Some(BodyKind::Html));
        assert_eq!(slot_for("image/png"), None);
        assert_eq!(slot_for(""), None);
    }

    #[test]
    fn test_first_text_part_wins() {
        let body = multipart(&[("text/plain", "", "first"), ("text/plain", "", "second")]);
        let mut result = DecodedContent::default();
        assemble_multipart(&mut result, &body, "b0undary", 16).unwrap();
        assert_eq!(result.text_body, "first");
    }

    #[test]
    fn test_text_and_html_independent() {
        let body = multipart(&[
            ("text/html; charset=utf-8", "quoted-printable", "<p>caf=C3=A9</p>"),
            ("text/plain", "base64", "SGVsbG8sIFdvcmxkIQ=="),
        ]);
        let mut result = DecodedContent::default();
        assemble_multipart(&mut result, &body, "b0undary", 16).unwrap();
        assert_eq!(result.html_body, "<p>café</p>");
        assert_eq!(result.text_body, "Hello, World!");
    }

    #[test]
    fn test_undecodable_part_assigned_verbatim() {
        let body = multipart(&[
            ("text/plain", "base64", "not*valid*base64!"),
            ("text/html", "base64", "<p>plain html</p>"),
        ]);
        let mut result = DecodedContent::default();
        assemble_multipart(&mut result, &body, "b0undary", 16).unwrap();
        assert_eq!(result.text_body, "not*valid*base64!");
        assert_eq!(result.html_body, "<p>plain html</p>");
    }

    #[test]
    fn test_existing_slot_not_overwritten() {
        let body = multipart(&[("text/plain", "", "from part")]);
        let mut result = DecodedContent {
            text_body: "already set".into(),
            ..Default::default()
        };
        assemble_multipart(&mut result, &body, "b0undary", 16).unwrap();
        assert_eq!(result.text_body, "already set");
    }

    #[test]
    fn test_unknown_types_and_attachments_dropped() {
        let body = "--b0undary\r\n\
Content-Type: text/plain\r\n\
Content-Disposition: attachment; filename=\"notes.txt\"\r\n\
\r\n\
attached notes\r\n\
--b0undary\r\n\
Content-Type: application/pdf\r\n\
\r\n\
%PDF\r\n\
--b0undary\r\n\
Content-Type: text/plain\r\n\
\r\n\
inline text\r\n\
--b0undary--";
        let mut result = DecodedContent::default();
        let seen = assemble_multipart(&mut result, body, "b0undary", 16).unwrap();
        assert_eq!(seen, 3);
        assert_eq!(result.text_body, "inline text");
        assert!(result.html_body.is_empty());
    }

    #[test]
    fn test_part_limit() {
        let body = multipart(&[
            ("image/gif", "", "GIF89a"),
            ("text/plain", "", "too late"),
        ]);
        let mut result = DecodedContent::default();
        let seen = assemble_multipart(&mut result, &body, "b0undary", 1).unwrap();
        assert_eq!(seen, 1);
        assert!(result.text_body.is_empty());
    }

    #[test]
    fn test_one_level_of_nesting() {
        let body = "--outer_b0undary\r\n\
Content-Type: multipart/alternative; boundary=\"inner_b0undary\"\r\n\
\r\n\
--inner_b0undary\r\n\
Content-Type: text/plain\r\n\
\r\n\
nested text\r\n\
--inner_b0undary\r\n\
Content-Type: text/html\r\n\
\r\n\
<i>nested html</i>\r\n\
--inner_b0undary--\r\n\
--outer_b0undary\r\n\
Content-Type: text/plain\r\n\
\r\n\
outer text\r\n\
--outer_b0undary--";
        let mut result = DecodedContent::default();
        assemble_multipart(&mut result, body, "outer_b0undary", 16).unwrap();
        assert_eq!(result.text_body, "nested text");
        assert_eq!(result.html_body, "<i>nested html</i>");
    }

    #[test]
    fn test_missing_boundary() {
        let mut result = DecodedContent::default();
        assert!(assemble_multipart(&mut result, "--x\r\n", "", 16).is_err());
        assert_eq!(result, DecodedContent::default());
    }
}
