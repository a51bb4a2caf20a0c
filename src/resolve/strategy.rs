//! The ordered decoding strategies applied to one source.
//!
//! Each strategy looks at the working [`Source`] and the partially filled
//! [`DecodedContent`], and either passes control on ([`Flow::Continue`]),
//! finishes the source ([`Flow::Done`]), or fails. Failures are absorbed by
//! [`run_chain`], which moves on to the next strategy with the result left as
//! it was.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};
use crate::model::content::{BodyKind, DecodedContent};
use crate::model::headers::HeaderMap;
use crate::model::media::{MediaType, TransferEncoding};
use crate::parser::transfer::{bytes_to_text, decode_base64, decode_transfer};
use crate::parser::{assemble, boundary, header, heuristic, message};

/// The content one chain run works on.
#[derive(Debug, Clone)]
pub struct Source<'a> {
    /// Working content; replaced when whole-body Base64 is unwrapped.
    pub content: Cow<'a, str>,
    /// Headers describing `content`, when they are known.
    pub declared: Option<Cow<'a, HeaderMap>>,
    /// `content` is already the result of a Base64 unwrap.
    pub base64_unwrapped: bool,
    /// Unstructured content may become `text_body` as-is.
    pub passthrough: bool,
}

impl<'a> Source<'a> {
    /// Content without headers.
    pub fn bare(content: &'a str) -> Self {
        Self {
            content: Cow::Borrowed(content),
            declared: None,
            base64_unwrapped: false,
            passthrough: true,
        }
    }

    /// A body together with the headers describing it.
    pub fn declared(content: &'a str, headers: Cow<'a, HeaderMap>) -> Self {
        Self {
            content: Cow::Borrowed(content),
            declared: Some(headers),
            base64_unwrapped: false,
            passthrough: true,
        }
    }

    fn declared_media_type(&self) -> Option<MediaType> {
        let raw = self.declared.as_deref()?.get_non_empty("content-type")?;
        MediaType::parse(raw).ok()
    }

    fn declares_multipart(&self) -> bool {
        self.declared_media_type()
            .map(|mt| mt.is_multipart())
            .unwrap_or(false)
    }
}

/// Outcome of a successful strategy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Let the next strategy look at the source.
    Continue,
    /// The source has been handled; skip the rest of the chain.
    Done,
}

/// One link of the decoding chain.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        source: &mut Source<'_>,
        result: &mut DecodedContent,
        config: &DecoderConfig,
    ) -> Result<Flow>;
}

/// Whole-body Base64 unwrap, then heuristic multipart, then declared
/// structure, then unstructured pass-through.
pub fn default_chain() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(UnwrapBase64),
        Box::new(HeuristicMultipart),
        Box::new(DeclaredStructure),
        Box::new(Passthrough),
    ]
}

/// Run `chain` over `source`, absorbing strategy failures.
pub fn run_chain(
    chain: &[Box<dyn Strategy>],
    source: &mut Source<'_>,
    result: &mut DecodedContent,
    config: &DecoderConfig,
) {
    for strategy in chain {
        match strategy.apply(source, result, config) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Done) => {
                trace!(strategy = strategy.name(), "Source handled");
                return;
            }
            Err(e) if e.is_missing_boundary() => {
                debug!(strategy = strategy.name(), "Could not split multipart, trying next");
            }
            Err(e) => {
                debug!(strategy = strategy.name(), error = %e, "Strategy failed, trying next");
            }
        }
    }
}

/// Decode `content` if the whole of it is Base64.
///
/// With `require_utf8_base64`, decodings that are not valid UTF-8 are refused.
pub(crate) fn unwrap_base64(content: &str, config: &DecoderConfig) -> Option<String> {
    if !heuristic::looks_like_base64(content) {
        return None;
    }
    let bytes = decode_base64(content).ok()?;
    if config.require_utf8_base64 && std::str::from_utf8(&bytes).is_err() {
        debug!("Base64-looking content is not UTF-8, left as-is");
        return None;
    }
    Some(bytes_to_text(bytes))
}

/// Trailing line breaks are not part of a single-part body.
fn trim_trailing_breaks(body: &str) -> &str {
    body.trim_end_matches(['\r', '\n'])
}

/// Step 1: replace whole-body Base64 with its decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwrapBase64;

impl Strategy for UnwrapBase64 {
    fn name(&self) -> &'static str {
        "unwrap-base64"
    }

    fn apply(
        &self,
        source: &mut Source<'_>,
        _result: &mut DecodedContent,
        config: &DecoderConfig,
    ) -> Result<Flow> {
        if source.base64_unwrapped {
            return Ok(Flow::Continue);
        }
        if let Some(decoded) = unwrap_base64(&source.content, config) {
            source.content = Cow::Owned(decoded);
            source.base64_unwrapped = true;
        }
        Ok(Flow::Continue)
    }
}

/// Step 2: content that looks like MIME is split on the declared boundary,
/// or on one guessed from the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMultipart;

impl Strategy for HeuristicMultipart {
    fn name(&self) -> &'static str {
        "heuristic-multipart"
    }

    fn apply(
        &self,
        source: &mut Source<'_>,
        result: &mut DecodedContent,
        config: &DecoderConfig,
    ) -> Result<Flow> {
        if !heuristic::looks_like_mime(&source.content) {
            return Ok(Flow::Continue);
        }
        let boundary = boundary::resolve(source.declared.as_deref(), &source.content)
            .ok_or(DecodeError::MissingBoundary)?;
        let seen = assemble::assemble_multipart(result, &source.content, &boundary, config.max_parts)?;
        if seen == 0 {
            // Guessed boundary delimits nothing
            return Err(DecodeError::MissingBoundary);
        }
        Ok(Flow::Done)
    }
}

/// Step 3: media-type driven decoding from declared headers, or from the
/// headers of the content itself when it mentions MIME headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredStructure;

impl Strategy for DeclaredStructure {
    fn name(&self) -> &'static str {
        "declared-structure"
    }

    fn apply(
        &self,
        source: &mut Source<'_>,
        result: &mut DecodedContent,
        config: &DecoderConfig,
    ) -> Result<Flow> {
        if let Some(headers) = source.declared.as_deref() {
            return decode_declared(headers, &source.content, source.base64_unwrapped, result, config);
        }

        if !heuristic::mentions_mime_headers(&source.content) {
            return Ok(Flow::Continue);
        }
        let (headers, body) = message::split_message(&source.content)?;
        header::fill_metadata(result, &headers);
        decode_declared(&headers, body, false, result, config)
    }
}

/// Decode `body` as described by `headers`.
///
/// `already_unwrapped` suppresses a declared Base64 transfer encoding that
/// step 1 has applied.
fn decode_declared(
    headers: &HeaderMap,
    body: &str,
    already_unwrapped: bool,
    result: &mut DecodedContent,
    config: &DecoderConfig,
) -> Result<Flow> {
    let encoding = match TransferEncoding::from_optional(headers.get("content-transfer-encoding")) {
        TransferEncoding::Base64 if already_unwrapped => TransferEncoding::Unspecified,
        other => other,
    };

    let Some(raw_type) = headers.get_non_empty("content-type") else {
        result.offer_body(BodyKind::Text, decode_transfer(trim_trailing_breaks(body), encoding));
        return Ok(Flow::Done);
    };

    let media_type = MediaType::parse(raw_type)?;
    if media_type.is_multipart() {
        let boundary = boundary::from_media_type(&media_type).ok_or(DecodeError::MissingBoundary)?;
        assemble::assemble_multipart(result, body, boundary, config.max_parts)?;
        return Ok(Flow::Done);
    }

    let kind = if media_type.is_text_plain() {
        BodyKind::Text
    } else if media_type.is_text_html() {
        BodyKind::Html
    } else {
        return Ok(Flow::Continue);
    };
    result.offer_body(kind, decode_transfer(trim_trailing_breaks(body), encoding));
    Ok(Flow::Done)
}

/// Last resort: content that is neither declared nor shaped as multipart is
/// taken as the plain-text body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Strategy for Passthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn apply(
        &self,
        source: &mut Source<'_>,
        result: &mut DecodedContent,
        _config: &DecoderConfig,
    ) -> Result<Flow> {
        if !source.passthrough
            || source.declares_multipart()
            || heuristic::looks_like_mime(&source.content)
        {
            return Ok(Flow::Continue);
        }
        result.offer_body(BodyKind::Text, trim_trailing_breaks(&source.content).to_string());
        Ok(Flow::Done)
    }
}
