//! sharelink: self-contained, URL-safe share tokens for text documents.
//!
//! A share token carries the whole document, compressed, so a link can be
//! opened without any server-side storage.
//!
//! # Overview
//!
//! Two schemes produce tokens:
//! - **Compact**: LZ-string style dictionary compression written directly in
//!   the URL-safe alphabet `A-Z a-z 0-9 - _`. Untagged.
//! - **Deflate**: DEFLATE over the UTF-8 bytes, base64url without padding,
//!   tagged with a `gz:` prefix.
//!
//! [`encode`] runs both and keeps the shorter token (compact on ties).
//! [`decode`] tries compact first, then DEFLATE with or without the marker,
//! and returns `None` instead of failing.
//!
//! # Quick Start
//!
//! ```rust
//! use sharelink::{decode, encode};
//!
//! let source = "graph TD; A-->B;";
//! let token = encode(source);
//! assert!(token.bytes().all(|b| b.is_ascii_alphanumeric() || b"-_:".contains(&b)));
//! assert_eq!(decode(&token).as_deref(), Some(source));
//!
//! assert_eq!(decode("not-a-valid-token-@@@"), None);
//! ```
//!
//! # Modules
//!
//! - [`codec`]: Both schemes and the selecting encoder/decoder
//! - [`document`]: Diagram and Markdown payloads with defaults
//! - [`validate`]: Token alphabet checks
//! - [`error`]: Error types
//! - [`limits`]: Constants and decode limits
//!
//! # Token Format
//!
//! - Compact: `[A-Za-z0-9\-_]+`
//! - Deflate: `gz:` + `[A-Za-z0-9\-_]+`
//!
//! Tokens without the marker that fail compact decoding are retried as
//! DEFLATE, so links minted before the marker existed keep working.

pub mod codec;
pub mod document;
pub mod error;
pub mod limits;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{
    decode, decode_detailed, decode_with_options, encode, encode_with_options, Alphabet,
    CodecOptions, Decoded, DeflateFormat, Encoded, Scheme,
};
pub use document::{
    load_diagram, load_diagram_or_default, load_markdown, load_markdown_or_default, DocumentKind,
    MarkdownDocument,
};
pub use error::{DecodeError, DocumentError, EncodeError, ErrorCode};
pub use validate::{validate_token, TokenShape};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
