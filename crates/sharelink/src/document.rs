//! Document payloads carried by share tokens.
//!
//! Diagram tokens carry the diagram source as-is. Markdown tokens carry a JSON
//! record `{"title": ..., "content": ...}`; text that is not JSON is read as
//! bare Markdown content so hand-made tokens still open.
//!
//! The loaders also open links minted with the stock LZ-string URI alphabet
//! (`+` and `-` for values 62 and 63). A link containing `+` can only be one of
//! those. A link using `-` but neither `+` nor `_` is ambiguous; it is read as
//! a current token first and as a stock link only if that fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::codec::{compact, decode_detailed, encode_with_options, Alphabet, CodecOptions, Encoded};
use crate::error::{DecodeError, DocumentError, EncodeError};
use crate::limits::{compact_output_bound, DEFLATE_MARKER};

/// Diagram shown when no token is given.
pub const DEFAULT_DIAGRAM: &str = "graph TD\n    A[Start] --> B{Is it working?}\n    B -- Yes --> C[Great!]\n    B -- No --> D[Debug]";

/// Markdown shown when no token is given.
pub const DEFAULT_MARKDOWN: &str = "# Welcome to Markdown Editor\n\n## Start Writing\n\nThis is a markdown document. Use **bold** and *italic* text freely.\n\n### Features:\n- Live preview\n- Save and share\n- Simple formatting\n\n---\n\n*Edit the left pane to see live preview on the right.*";

/// Title of a freshly created Markdown document.
pub const DEFAULT_MARKDOWN_TITLE: &str = "New Document";

/// Title used when a payload has none.
pub const UNTITLED: &str = "Untitled";

/// Kind of document a token carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Diagram,
    Markdown,
}

impl DocumentKind {
    /// Returns the editor text for a new document of this kind.
    pub fn default_text(&self) -> &'static str {
        match self {
            DocumentKind::Diagram => DEFAULT_DIAGRAM,
            DocumentKind::Markdown => DEFAULT_MARKDOWN,
        }
    }
}

/// A titled Markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkdownDocument {
    pub title: String,
    pub content: String,
}

impl Default for MarkdownDocument {
    fn default() -> Self {
        Self::new(DEFAULT_MARKDOWN_TITLE, DEFAULT_MARKDOWN)
    }
}

impl MarkdownDocument {
    /// Creates a document.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Serializes the payload record, title first.
    pub fn to_json(&self) -> Result<String, EncodeError> {
        serde_json::to_string(self).map_err(|e| EncodeError::SerializationFailed(e.to_string()))
    }

    /// Reads a decoded payload.
    ///
    /// Any JSON value other than `null` is read as a record: a missing or
    /// falsy `content` is empty and a missing or falsy `title` is
    /// [`UNTITLED`]. Non-string fields are kept in their JSON text form. Text
    /// that is not JSON (or is `null`) becomes the content of an untitled
    /// document.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Null) => {
                debug!("markdown payload is null, using it as content");
                Self::new(UNTITLED, text)
            }
            Ok(record) => Self {
                title: field_text(record.get("title")).unwrap_or_else(|| UNTITLED.to_string()),
                content: field_text(record.get("content")).unwrap_or_default(),
            },
            Err(err) => {
                debug!(error = %err, "markdown payload is not JSON, using it as content");
                Self::new(UNTITLED, text)
            }
        }
    }

    /// Encodes the document into a share token.
    pub fn to_token(&self) -> Result<String, EncodeError> {
        Ok(self.to_token_with_options(&CodecOptions::default())?.token)
    }

    /// Encodes the document with explicit codec options.
    pub fn to_token_with_options(&self, options: &CodecOptions) -> Result<Encoded, EncodeError> {
        Ok(encode_with_options(&self.to_json()?, options))
    }

    /// Decodes a document from a share token.
    ///
    /// Stock LZ-string links are accepted as described in the module docs.
    pub fn from_token(token: &str) -> Result<Self, DocumentError> {
        Ok(Self::from_text(&decode_link(token)?))
    }
}

/// Text of a payload field. Absent, `null`, `false`, `0` and `""` count as
/// missing.
fn field_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Recovers the text behind a share link, current or stock LZ-string.
fn decode_link(token: &str) -> Result<String, DecodeError> {
    if token.contains('+') {
        return decode_stock_link(token);
    }
    match decode_detailed(token, &CodecOptions::default()) {
        Ok(decoded) => Ok(decoded.text),
        Err(err) if !token.contains('_') && !token.starts_with(DEFLATE_MARKER) => {
            decode_stock_link(token).map_err(|stock_err| {
                debug!(error = %stock_err, "not a stock lz-string link either");
                err
            })
        }
        Err(err) => Err(err),
    }
}

fn decode_stock_link(token: &str) -> Result<String, DecodeError> {
    compact::decompress_with(token, Alphabet::LegacyUri, compact_output_bound(token.len()))
}

/// Loads a Markdown document from an optional token.
///
/// No token (or an empty one) yields the default document.
pub fn load_markdown(token: Option<&str>) -> Result<MarkdownDocument, DocumentError> {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => MarkdownDocument::from_token(token),
        None => Ok(MarkdownDocument::default()),
    }
}

/// Loads a Markdown document, falling back to the default on any failure.
pub fn load_markdown_or_default(token: Option<&str>) -> MarkdownDocument {
    load_markdown(token).unwrap_or_else(|err| {
        debug!(error = %err, "falling back to default markdown document");
        MarkdownDocument::default()
    })
}

/// Loads diagram source from an optional token.
///
/// No token (or an empty one) yields [`DEFAULT_DIAGRAM`].
pub fn load_diagram(token: Option<&str>) -> Result<String, DocumentError> {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => Ok(decode_link(token)?),
        None => Ok(DEFAULT_DIAGRAM.to_string()),
    }
}

/// Loads diagram source, falling back to [`DEFAULT_DIAGRAM`] on any failure.
pub fn load_diagram_or_default(token: Option<&str>) -> String {
    load_diagram(token).unwrap_or_else(|err| {
        debug!(error = %err, "falling back to default diagram");
        DEFAULT_DIAGRAM.to_string()
    })
}
