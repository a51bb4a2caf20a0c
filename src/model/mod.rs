//! Core data model: decoder inputs, decoded content, headers and media types.

pub mod content;
pub mod headers;
pub mod media;

pub use content::{BodyKind, DecodedContent, MetaField, RawEmailInput, StoredEmail};
pub use headers::HeaderMap;
pub use media::{MediaType, TransferEncoding};
