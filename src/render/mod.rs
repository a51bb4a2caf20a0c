//! Presentation of decoded content: display HTML and plain-text summaries.

pub mod html;
pub mod text;
