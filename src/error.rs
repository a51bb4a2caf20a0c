//! Centralized error types for mailcat.

use thiserror::Error;

/// All errors produced by the mailcat library.
///
/// Most of these never reach a caller of [`crate::resolve`]: the resolver
/// absorbs them and moves on to the next strategy. They surface from the
/// lower-level building blocks and from the CLI.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Multipart content was declared (or detected) but no usable boundary exists.
    #[error("multipart content declared without a usable boundary")]
    MissingBoundary,

    /// A `Content-Type` value could not be parsed as `type/subtype; params`.
    #[error("unparseable media type: {0:?}")]
    InvalidMediaType(String),

    /// Base64 payload with bad alphabet or padding.
    #[error("invalid base64 data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Quoted-printable payload that could not be decoded.
    #[error("invalid quoted-printable data: {0}")]
    InvalidQuotedPrintable(String),

    /// The text does not start with a recognizable header block.
    #[error("no header block found")]
    MissingHeaderBlock,

    /// The input exceeds the configured size limit.
    #[error("input of {size} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    /// A stored e-mail record could not be deserialized.
    #[error("invalid stored e-mail record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, DecodeError>`.
pub type Result<T> = std::result::Result<T, DecodeError>;

impl DecodeError {
    /// `true` for the "could not split multipart" condition, which callers
    /// may want to log separately from ordinary decode noise.
    pub fn is_missing_boundary(&self) -> bool {
        matches!(self, Self::MissingBoundary)
    }
}
