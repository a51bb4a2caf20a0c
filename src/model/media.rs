//! Media types (`Content-Type`) and transfer encodings (`Content-Transfer-Encoding`).

use std::collections::BTreeMap;

use crate::error::{DecodeError, Result};

/// The parsed form of a `Content-Type` value.
///
/// `essence` is the lower-cased `type/subtype`; parameter names are
/// lower-cased, values are kept verbatim (minus surrounding quotes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub essence: String,
    pub params: BTreeMap<String, String>,
}

impl MediaType {
    /// Parse `type/subtype; name=value; name="quoted; value"`.
    ///
    /// Fails when the essence is not of the form `type/subtype`. Malformed
    /// parameters (no `=`) are skipped.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = split_params(raw).into_iter();
        let essence = segments.next().unwrap_or_default().trim().to_ascii_lowercase();

        let (main, sub) = essence
            .split_once('/')
            .ok_or_else(|| DecodeError::InvalidMediaType(raw.to_string()))?;
        if !is_token(main) || !is_token(sub) {
            return Err(DecodeError::InvalidMediaType(raw.to_string()));
        }

        let mut params = BTreeMap::new();
        for segment in segments {
            let Some((name, value)) = segment.split_once('=') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                continue;
            }
            params
                .entry(name)
                .or_insert_with(|| unquote(value.trim()).to_string());
        }

        Ok(Self { essence, params })
    }

    /// The top-level type (`"multipart"` for `multipart/mixed`).
    pub fn main_type(&self) -> &str {
        self.essence.split('/').next().unwrap_or("")
    }

    pub fn is_multipart(&self) -> bool {
        self.main_type() == "multipart"
    }

    pub fn is_text_plain(&self) -> bool {
        self.essence == "text/plain"
    }

    pub fn is_text_html(&self) -> bool {
        self.essence == "text/html"
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Split a header value on `;`, ignoring separators inside double quotes.
fn split_params(raw: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    let mut escaped = false;

    for (idx, ch) in raw.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                result.push(&raw[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    result.push(&raw[start..]);
    result
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// RFC 2045 token characters.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b)
        })
}

/// A `Content-Transfer-Encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    Base64,
    QuotedPrintable,
    SevenBit,
    EightBit,
    Binary,
    /// Missing or unrecognized; decoded as pass-through.
    #[default]
    Unspecified,
}

impl TransferEncoding {
    /// Map a header value (case-insensitive, surrounding whitespace ignored).
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "7bit" => Self::SevenBit,
            "8bit" => Self::EightBit,
            "binary" => Self::Binary,
            _ => Self::Unspecified,
        }
    }

    /// Like [`from_header`](Self::from_header) for an optional value.
    pub fn from_optional(value: Option<&str>) -> Self {
        value.map(Self::from_header).unwrap_or_default()
    }
}
