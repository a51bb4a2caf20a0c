//! E-mail content decoding: headers, transfer encodings, heuristics and multipart handling.

pub mod assemble;
pub mod boundary;
pub mod header;
pub mod heuristic;
pub mod message;
pub mod multipart;
pub mod transfer;

/// Split on line breaks, accepting CRLF as well as bare LF.
///
/// A trailing `\r` is removed from every line; the final line is yielded even
/// when empty, so `"a\r\n"` gives `["a", ""]`.
pub(crate) fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}
