//! Splitting a full raw message (RFC 5322) into its header block and body.

use crate::error::{DecodeError, Result};
use crate::model::headers::HeaderMap;
use crate::parser::{header, lines};

/// Split `raw` at the first blank line into parsed headers and the body.
///
/// A UTF-8 BOM and a leading mbox `From ` separator line are skipped. Fails
/// with [`DecodeError::MissingHeaderBlock`] when there is no blank line or
/// the text before it does not start with a header field.
pub fn split_message(raw: &str) -> Result<(HeaderMap, &str)> {
    let text = skip_from_line(raw.strip_prefix('\u{feff}').unwrap_or(raw));

    let (head, body) = find_header_end(text).ok_or(DecodeError::MissingHeaderBlock)?;
    let first_line = lines(head).next().unwrap_or("");
    if !is_header_field(first_line) {
        return Err(DecodeError::MissingHeaderBlock);
    }

    Ok((header::unfold_headers(lines(head)), body))
}

/// Skip the `From ` separator line at the start of mbox-framed messages.
fn skip_from_line(text: &str) -> &str {
    if text.starts_with("From ") {
        if let Some(pos) = text.find('\n') {
            return &text[pos + 1..];
        }
    }
    text
}

/// Locate the first blank line; returns `(header_block, body)`.
///
/// Whichever of `\r\n\r\n` and `\n\n` comes first wins.
fn find_header_end(text: &str) -> Option<(&str, &str)> {
    let crlf = text.find("\r\n\r\n").map(|pos| (pos, pos + 4));
    let lf = text.find("\n\n").map(|pos| (pos, pos + 2));
    let (head_end, body_start) = match (crlf, lf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some((&text[..head_end], &text[body_start..]))
}

/// `Name: value` where the name is printable ASCII without spaces or colons.
fn is_header_field(line: &str) -> bool {
    match line.split_once(':') {
        Some((name, _)) => {
            !name.is_empty() && name.bytes().all(|b| b.is_ascii_graphic() && b != b':')
        }
        None => false,
    }
}
