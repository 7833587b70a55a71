//! Error types for template filling and document merging

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::template::{PlaceholderKind, ResolveError};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Errors that abort a merge. No partial document is ever returned alongside one.
#[derive(Error, Debug)]
pub enum MergeError {
    /// Template is not valid JSON after substitution, or has the wrong shape
    #[error("malformed template: {reason}")]
    MalformedTemplate {
        reason: String,
        /// 1-based line of the failure, 0 when the JSON parsed but the shape is wrong
        line: usize,
        /// 1-based column of the failure, 0 when unknown
        column: usize,
        /// Filled template text the location refers to
        filled: Option<String>,
    },

    /// Target document lacks the element collection or usable anchor coordinates
    #[error("malformed target document: {reason}")]
    MalformedTarget { reason: String },

    /// Target collection has nothing to anchor the new position against
    #[error("target collection '{collection}' is empty")]
    EmptyTargetCollection { collection: String },

    /// The value resolver failed or was cancelled
    #[error("resolution of {kind} placeholder '{name}' aborted: {source}")]
    ResolutionAborted {
        kind: PlaceholderKind,
        name: String,
        #[source]
        source: ResolveError,
    },

    /// A resolved value cannot be written into the document
    #[error("invalid value for placeholder '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// The id generator kept producing identifiers that already exist
    #[error("could not generate a unique identifier after {attempts} attempts")]
    IdExhausted { attempts: usize },
}

impl MergeError {
    /// Create a shape error for a template that parsed but is not usable
    pub fn template_shape(reason: impl Into<String>) -> Self {
        Self::MalformedTemplate {
            reason: reason.into(),
            line: 0,
            column: 0,
            filled: None,
        }
    }

    /// Create a malformed target error
    pub fn target(reason: impl Into<String>) -> Self {
        Self::MalformedTarget {
            reason: reason.into(),
        }
    }

    /// Create an empty collection error
    pub fn empty(collection: impl Into<String>) -> Self {
        Self::EmptyTargetCollection {
            collection: collection.into(),
        }
    }

    /// Attach the filled text a template syntax error was found in
    pub fn with_filled_text(mut self, text: &str) -> Self {
        if let Self::MalformedTemplate { filled, .. } = &mut self {
            *filled = Some(text.to_string());
        }
        self
    }

    /// Filled template text, when the error carries it
    pub fn filled_text(&self) -> Option<&str> {
        match self {
            Self::MalformedTemplate { filled, .. } => filled.as_deref(),
            _ => None,
        }
    }

    /// Byte span of the failure inside the filled template text, if known
    pub fn span(&self, source: &str) -> Option<Span> {
        match self {
            Self::MalformedTemplate { line, column, .. } if *line > 0 => {
                let offset = line_column_offset(source, *line, *column);
                let end = (offset + 1).min(source.len());
                Some(offset..end.max(offset))
            }
            _ => None,
        }
    }

    /// Format the error with source context using ariadne
    ///
    /// Only malformed-template errors carry a location; everything else is
    /// rendered as its plain message.
    pub fn format(&self, source: &str, filename: &str) -> String {
        let Some(span) = self.span(source) else {
            return self.to_string();
        };
        // ariadne counts characters, not bytes
        let span = char_offset(source, span.start)..char_offset(source, span.end);

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message("template JSON breaks here")
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for MergeError {
    fn from(err: serde_json::Error) -> Self {
        MergeError::MalformedTemplate {
            reason: err.to_string(),
            line: err.line(),
            column: err.column(),
            filled: None,
        }
    }
}

/// Number of characters starting before byte `offset`
fn char_offset(source: &str, offset: usize) -> usize {
    source.char_indices().take_while(|(i, _)| *i < offset).count()
}

/// Convert a 1-based line/column pair into a byte offset, clamped to the source
fn line_column_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (idx, text) in source.split_inclusive('\n').enumerate() {
        if idx + 1 == line {
            let col = column.saturating_sub(1).min(text.len());
            return offset + col;
        }
        offset += text.len();
    }
    source.len()
}
