//! Decoder input shapes and the decoded result.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::headers::HeaderMap;
use crate::config::RenderConfig;

/// One of the payload shapes upstream producers hand us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEmailInput {
    /// Headers and body concatenated, CRLF (or LF) delimited.
    FullMessage(String),
    /// A body whose headers were split off and supplied separately.
    HeaderMapPlusBody { headers: HeaderMap, body: String },
    /// A body of unknown shape with no headers at all.
    BodyOnly(String),
}

impl RawEmailInput {
    /// Size in bytes of the textual payload.
    pub fn len(&self) -> usize {
        match self {
            Self::FullMessage(text) | Self::BodyOnly(text) => text.len(),
            Self::HeaderMapPlusBody { body, .. } => body.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which body slot a piece of content belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Text,
    Html,
}

/// Best-effort decoded content of one message.
///
/// Produced fresh per resolution. A slot, once non-empty, is never
/// overwritten within the same resolution: every writer goes through
/// [`offer_body`](Self::offer_body) / [`offer_meta`](Self::offer_meta).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedContent {
    pub subject: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Parsed `Date:` header, when one was found.
    pub date: Option<DateTime<Utc>>,
    pub text_body: String,
    pub html_body: String,
}

/// Metadata fields carried next to the bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Subject,
    From,
    To,
}

impl DecodedContent {
    /// Fill the `kind` slot with `value` if the slot is still empty.
    ///
    /// Empty values are never stored. Returns `true` when the slot was filled.
    pub fn offer_body(&mut self, kind: BodyKind, value: String) -> bool {
        let slot = match kind {
            BodyKind::Text => &mut self.text_body,
            BodyKind::Html => &mut self.html_body,
        };
        if !slot.is_empty() || value.is_empty() {
            return false;
        }
        *slot = value;
        true
    }

    /// Fill a metadata field if it is still unset. Blank values are ignored.
    pub fn offer_meta(&mut self, field: MetaField, value: &str) -> bool {
        let slot = match field {
            MetaField::Subject => &mut self.subject,
            MetaField::From => &mut self.from,
            MetaField::To => &mut self.to,
        };
        let value = value.trim();
        if slot.is_some() || value.is_empty() {
            return false;
        }
        *slot = Some(value.to_string());
        true
    }

    pub fn offer_date(&mut self, date: Option<DateTime<Utc>>) {
        if self.date.is_none() {
            self.date = date;
        }
    }

    /// Both body slots are filled; nothing later can change them.
    pub fn bodies_complete(&self) -> bool {
        !self.text_body.is_empty() && !self.html_body.is_empty()
    }

    /// HTML for display: the decoded HTML body, or one synthesized from the
    /// text body. Nothing is written back.
    pub fn display_html(&self) -> Cow<'_, str> {
        self.display_html_with(&RenderConfig::default())
    }

    /// [`display_html`](Self::display_html) with explicit render settings.
    pub fn display_html_with(&self, config: &RenderConfig) -> Cow<'_, str> {
        if !self.html_body.is_empty() {
            Cow::Borrowed(&self.html_body)
        } else if !self.text_body.is_empty() {
            Cow::Owned(crate::render::html::text_to_html_with(&self.text_body, config))
        } else {
            Cow::Borrowed("")
        }
    }
}

/// A persisted e-mail record as received from the ingestion worker.
///
/// Every field is optional on the wire; missing ones deserialize empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    /// Body as stored: decoded text, raw MIME, or Base64.
    pub body: String,
    pub html_body: String,
    /// Header map captured at ingestion (lower-cased names expected).
    pub headers: HashMap<String, String>,
    /// Archived full raw message, if the worker kept one.
    pub raw_email: String,
}

impl StoredEmail {
    /// Parse a JSON record.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The primary decoder input: the body, with the stored headers when there are any.
    pub fn primary_input(&self) -> RawEmailInput {
        if self.headers.is_empty() {
            RawEmailInput::BodyOnly(self.body.clone())
        } else {
            RawEmailInput::HeaderMapPlusBody {
                headers: HeaderMap::from(&self.headers),
                body: self.body.clone(),
            }
        }
    }

    /// The archived raw message, if non-empty.
    pub fn archived_raw(&self) -> Option<&str> {
        Some(self.raw_email.as_str()).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_body_first_wins() {
        let mut content = DecodedContent::default();
        assert!(content.offer_body(BodyKind::Text, "first".into()));
        assert!(!content.offer_body(BodyKind::Text, "second".into()));
        assert_eq!(content.text_body, "first");
        assert!(content.html_body.is_empty());
    }

    #[test]
    fn test_offer_body_ignores_empty() {
        let mut content = DecodedContent::default();
        assert!(!content.offer_body(BodyKind::Html, String::new()));
        assert!(content.offer_body(BodyKind::Html, "<p>x</p>".into()));
        assert_eq!(content.html_body, "<p>x</p>");
    }

    #[test]
    fn test_bodies_complete_needs_both_slots() {
        let mut content = DecodedContent::default();
        content.offer_body(BodyKind::Html, "<p>x</p>".into());
        assert!(!content.bodies_complete());
        content.offer_body(BodyKind::Text, "x".into());
        assert!(content.bodies_complete());
    }

    #[test]
    fn test_offer_meta_trims_and_keeps_first() {
        let mut content = DecodedContent::default();
        assert!(!content.offer_meta(MetaField::Subject, "   "));
        assert!(content.offer_meta(MetaField::Subject, " Hi "));
        assert!(!content.offer_meta(MetaField::Subject, "Other"));
        assert_eq!(content.subject.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_display_html_prefers_decoded_html() {
        let content = DecodedContent {
            text_body: "plain".into(),
            html_body: "<b>rich</b>".into(),
            ..Default::default()
        };
        assert_eq!(content.display_html(), "<b>rich</b>");
    }

    #[test]
    fn test_display_html_synthesizes_without_storing() {
        let content = DecodedContent {
            text_body: "a < b".into(),
            ..Default::default()
        };
        let html = content.display_html();
        assert!(html.contains("a &lt; b"));
        assert!(content.html_body.is_empty());
    }

    #[test]
    fn test_stored_email_partial_json() {
        let stored = StoredEmail::from_json(r#"{"from":"a@b.com","body":"hi"}"#).unwrap();
        assert_eq!(stored.from, "a@b.com");
        assert_eq!(stored.primary_input(), RawEmailInput::BodyOnly("hi".into()));
        assert_eq!(stored.archived_raw(), None);
    }
}
