//! The decoding façade.
//!
//! A [`Resolver`] runs the strategy chain over the primary input, then over
//! an archived raw message for whatever is still missing. It never fails:
//! anything that cannot be decoded leaves the corresponding field empty.

pub mod strategy;

use std::borrow::Cow;

use tracing::debug;

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::model::content::{BodyKind, DecodedContent, MetaField, RawEmailInput, StoredEmail};
use crate::parser::{header, message};
use strategy::{Source, Strategy};

/// Decodes raw email input into [`DecodedContent`].
///
/// A resolver holds no per-call state and can be shared across threads.
pub struct Resolver {
    config: DecoderConfig,
    chain: Vec<Box<dyn Strategy>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.chain.iter().map(|s| s.name()).collect();
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("chain", &names)
            .finish()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl Resolver {
    pub fn new(config: DecoderConfig) -> Self {
        Self::with_chain(config, strategy::default_chain())
    }

    /// A resolver running a custom strategy chain.
    pub fn with_chain(config: DecoderConfig, chain: Vec<Box<dyn Strategy>>) -> Self {
        Self { config, chain }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a single input.
    pub fn resolve(&self, input: &RawEmailInput) -> DecodedContent {
        self.resolve_with_archive(input, None)
    }

    /// Decode `input`, then let `archived_raw` fill fields that are still
    /// empty. Fields produced from `input` are never replaced.
    pub fn resolve_with_archive(&self, input: &RawEmailInput, archived_raw: Option<&str>) -> DecodedContent {
        let mut result = DecodedContent::default();
        self.resolve_primary(&mut result, input);
        self.resolve_archive(&mut result, archived_raw);
        result
    }

    /// Decode a stored record.
    ///
    /// Stored metadata is taken first, then the body is decoded. A stored
    /// HTML body fills `html_body` if the body produced none, and only then
    /// does the archived raw message fill what is still empty.
    pub fn resolve_stored(&self, stored: &StoredEmail) -> DecodedContent {
        let mut result = DecodedContent::default();
        result.offer_meta(MetaField::Subject, &stored.subject);
        result.offer_meta(MetaField::From, &stored.from);
        result.offer_meta(MetaField::To, &stored.to);

        self.resolve_primary(&mut result, &stored.primary_input());
        result.offer_body(BodyKind::Html, stored.html_body.clone());
        self.resolve_archive(&mut result, stored.archived_raw());
        result
    }

    fn resolve_primary(&self, result: &mut DecodedContent, input: &RawEmailInput) {
        if !self.within_limit(input.len()) {
            return;
        }
        match input {
            RawEmailInput::FullMessage(raw) => self.run_message(raw, true, result),
            RawEmailInput::HeaderMapPlusBody { headers, body } => {
                header::fill_metadata(result, headers);
                self.run_source(Source::declared(body, Cow::Borrowed(headers)), result);
            }
            RawEmailInput::BodyOnly(body) => self.run_source(Source::bare(body), result),
        }
    }

    fn resolve_archive(&self, result: &mut DecodedContent, archived_raw: Option<&str>) {
        if result.bodies_complete() {
            return;
        }
        if let Some(raw) = archived_raw.filter(|raw| !raw.trim().is_empty()) {
            if self.within_limit(raw.len()) {
                debug!("Filling empty fields from archived raw message");
                self.run_message(raw, false, result);
            }
        }
    }

    /// Decode a complete message. `passthrough` decides whether text that
    /// turns out to have no header block may become `text_body` as-is.
    fn run_message(&self, raw: &str, passthrough: bool, result: &mut DecodedContent) {
        let unwrapped = strategy::unwrap_base64(raw, &self.config);
        let text = unwrapped.as_deref().unwrap_or(raw);

        match message::split_message(text) {
            Ok((headers, body)) => {
                header::fill_metadata(result, &headers);
                self.run_source(Source::declared(body, Cow::Owned(headers)), result);
            }
            Err(e) => {
                debug!(error = %e, "Treating message as a bare body");
                let mut source = Source::bare(text);
                source.base64_unwrapped = unwrapped.is_some();
                source.passthrough = passthrough;
                self.run_source(source, result);
            }
        }
    }

    fn run_source(&self, mut source: Source<'_>, result: &mut DecodedContent) {
        strategy::run_chain(&self.chain, &mut source, result, &self.config);
    }

    fn within_limit(&self, size: usize) -> bool {
        if size <= self.config.max_input_size {
            return true;
        }
        let e = DecodeError::InputTooLarge {
            size,
            limit: self.config.max_input_size,
        };
        debug!(error = %e, "Source skipped");
        false
    }
}
