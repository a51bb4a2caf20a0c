//! Content-Transfer-Encoding decoding.
//!
//! [`decode_transfer`] is total: a payload that fails to decode comes back
//! unchanged. [`try_decode`] exposes the underlying error for callers that
//! want to know.

use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::error::{DecodeError, Result};
use crate::model::media::TransferEncoding;

/// Standard alphabet with canonical padding, tolerant of non-zero trailing bits.
pub(crate) const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode `content` according to `encoding`, degrading to pass-through.
pub fn decode_transfer(content: &str, encoding: TransferEncoding) -> String {
    match try_decode(content, encoding) {
        Ok(bytes) => bytes_to_text(bytes),
        Err(_) => content.to_string(),
    }
}

/// Decode `content`, reporting malformed payloads.
///
/// For the identity encodings the bytes of `content` are returned as-is.
pub fn try_decode(content: &str, encoding: TransferEncoding) -> Result<Vec<u8>> {
    match encoding {
        TransferEncoding::Base64 => decode_base64(content),
        TransferEncoding::QuotedPrintable => {
            quoted_printable::decode(content.as_bytes(), quoted_printable::ParseMode::Robust)
                .map_err(|e| DecodeError::InvalidQuotedPrintable(format!("{e:?}")))
        }
        TransferEncoding::SevenBit
        | TransferEncoding::EightBit
        | TransferEncoding::Binary
        | TransferEncoding::Unspecified => Ok(content.as_bytes().to_vec()),
    }
}

/// Base64-decode after removing CR, LF and space characters.
pub fn decode_base64(content: &str) -> Result<Vec<u8>> {
    Ok(BASE64.decode(strip_base64_whitespace(content))?)
}

/// Remove the separators line-wrapped Base64 carries (`\r`, `\n`, space).
pub(crate) fn strip_base64_whitespace(content: &str) -> String {
    content
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | ' '))
        .collect()
}

/// Decoded bytes become text without charset transcoding; invalid UTF-8
/// sequences are replaced.
pub(crate) fn bytes_to_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
