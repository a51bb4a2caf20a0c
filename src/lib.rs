//! `mailcat`: best-effort decoding of raw e-mail payloads.
//!
//! Upstream producers hand over messages in inconsistent shapes: full raw
//! MIME, Base64 of a whole message, a body with headers split off, or text
//! that was already decoded. This crate recovers a plain-text body, an HTML
//! body and the basic metadata from any of them, and can synthesize display
//! HTML from plain text.
//!
//! ```
//! use mailcat::model::RawEmailInput;
//!
//! let decoded = mailcat::resolve(&RawEmailInput::FullMessage("SGVsbG8sIFdvcmxkIQ==".into()));
//! assert_eq!(decoded.text_body, "Hello, World!");
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod resolve;

pub use model::{DecodedContent, RawEmailInput, StoredEmail};
pub use resolve::Resolver;

/// Decode `input` with the default decoder settings.
pub fn resolve(input: &RawEmailInput) -> DecodedContent {
    Resolver::default().resolve(input)
}
