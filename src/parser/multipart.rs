//! Boundary-delimited multipart splitting.
//!
//! The splitter is a line-driven state machine:
//!
//! ```text
//! SeekBoundary --delimiter--> InHeaders --blank line--> InContent
//!      ^                         |  ^                      |
//!      |                         |  +------delimiter-------+  (part finalized)
//!      +-- preamble ignored      +--closing--> Closed <--closing--+
//! ```
//!
//! End of input finalizes a pending part as if the closing line were present.

use super::header;
use crate::error::{DecodeError, Result};
use crate::model::headers::HeaderMap;

/// Splitter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitState {
    /// Before the first delimiter (preamble).
    SeekBoundary,
    /// Reading the headers of the current part.
    InHeaders,
    /// Accumulating the body of the current part.
    InContent,
    /// Closing delimiter seen (or input exhausted).
    Closed,
}

/// How a single line relates to the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `--<boundary>`
    Delimiter,
    /// `--<boundary>--`
    Closing,
    /// Empty or whitespace-only.
    Blank,
    Other,
}

/// What the splitter does with a line, decided by [`transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Ignore,
    /// Emit the pending part (if it has a body) and start a new one.
    FinalizeAndBegin,
    /// Emit the pending part (if it has a body) and stop.
    FinalizeAndClose,
    HeaderLine,
    EndHeaders,
    BodyLine,
}

/// Pure transition function of the splitter.
pub fn transition(state: SplitState, kind: LineKind) -> (SplitState, Action) {
    match (state, kind) {
        (SplitState::Closed, _) => (SplitState::Closed, Action::Ignore),
        (_, LineKind::Closing) => (SplitState::Closed, Action::FinalizeAndClose),
        (_, LineKind::Delimiter) => (SplitState::InHeaders, Action::FinalizeAndBegin),
        (SplitState::SeekBoundary, _) => (SplitState::SeekBoundary, Action::Ignore),
        (SplitState::InHeaders, LineKind::Blank) => (SplitState::InContent, Action::EndHeaders),
        (SplitState::InHeaders, LineKind::Other) => (SplitState::InHeaders, Action::HeaderLine),
        (SplitState::InContent, _) => (SplitState::InContent, Action::BodyLine),
    }
}

/// One multipart section: its headers and its still-encoded body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPart {
    pub headers: HeaderMap,
    pub body: String,
}

/// Per-part accumulation state, cleared at every delimiter.
#[derive(Debug, Default)]
struct PendingPart<'a> {
    header_lines: Vec<&'a str>,
    headers: HeaderMap,
    body: String,
}

/// Iterator over the sections of a multipart body.
#[derive(Debug)]
pub struct MultipartSplitter<'a> {
    lines: std::str::Split<'a, char>,
    delimiter: String,
    closing: String,
    state: SplitState,
    pending: PendingPart<'a>,
}

impl<'a> MultipartSplitter<'a> {
    /// Split `content` on `boundary`. An empty boundary is the declared
    /// "could not split multipart" failure.
    pub fn new(content: &'a str, boundary: &str) -> Result<Self> {
        if boundary.is_empty() {
            return Err(DecodeError::MissingBoundary);
        }
        Ok(Self {
            lines: content.split('\n'),
            delimiter: format!("--{boundary}"),
            closing: format!("--{boundary}--"),
            state: SplitState::SeekBoundary,
            pending: PendingPart::default(),
        })
    }

    pub fn state(&self) -> SplitState {
        self.state
    }

    fn classify(&self, line: &str) -> LineKind {
        let candidate = line.trim_end();
        if candidate == self.closing {
            LineKind::Closing
        } else if candidate == self.delimiter {
            LineKind::Delimiter
        } else if candidate.trim_start().is_empty() {
            LineKind::Blank
        } else {
            LineKind::Other
        }
    }

    /// Take the pending part, returning it only if a body was collected.
    fn finalize(&mut self) -> Option<RawPart> {
        let pending = std::mem::take(&mut self.pending);
        if pending.body.is_empty() {
            return None;
        }
        Some(RawPart {
            headers: pending.headers,
            body: pending.body,
        })
    }

    fn apply(&mut self, action: Action, line: &'a str) -> Option<RawPart> {
        match action {
            Action::Ignore => None,
            Action::FinalizeAndBegin | Action::FinalizeAndClose => self.finalize(),
            Action::HeaderLine => {
                self.pending.header_lines.push(line);
                None
            }
            Action::EndHeaders => {
                let header_lines = std::mem::take(&mut self.pending.header_lines);
                self.pending.headers = header::unfold_headers(header_lines);
                None
            }
            Action::BodyLine => {
                if !self.pending.body.is_empty() {
                    self.pending.body.push_str("\r\n");
                }
                self.pending.body.push_str(line);
                None
            }
        }
    }
}

impl Iterator for MultipartSplitter<'_> {
    type Item = RawPart;

    fn next(&mut self) -> Option<RawPart> {
        while self.state != SplitState::Closed {
            let Some(raw_line) = self.lines.next() else {
                // Truncated input: the last part ends with the text
                let was_in_content = self.state == SplitState::InContent;
                self.state = SplitState::Closed;
                return if was_in_content { self.finalize() } else { None };
            };
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

            let (next_state, action) = transition(self.state, self.classify(line));
            self.state = next_state;
            if let Some(part) = self.apply(action, line) {
                return Some(part);
            }
        }
        None
    }
}

/// Collect every part of `content`; convenience over [`MultipartSplitter`].
pub fn split_parts(content: &str, boundary: &str) -> Result<Vec<RawPart>> {
    Ok(MultipartSplitter::new(content, boundary)?.collect())
}
