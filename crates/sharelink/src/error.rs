//! Error types for share token encoding and decoding.

use thiserror::Error;

/// Broad classes of decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Token contains characters outside its alphabet, or nothing at all.
    Alphabet,
    /// Token ended before the payload was complete.
    Truncated,
    /// Payload structure is invalid (unknown codes, bad base64, bad deflate).
    Corrupt,
    /// Decoded output would exceed the configured limit.
    Limit,
    /// Decoded units are not valid text.
    Text,
}

impl ErrorCode {
    /// Returns a short stable name for the code (e.g., "alphabet").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Alphabet => "alphabet",
            ErrorCode::Truncated => "truncated",
            ErrorCode::Corrupt => "corrupt",
            ErrorCode::Limit => "limit",
            ErrorCode::Text => "text",
        }
    }
}

/// Error while recovering text from a token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("token is empty")]
    EmptyToken,

    #[error("no payload after the gz: marker")]
    EmptyPayload,

    #[error("invalid character {char:?} at offset {offset}")]
    InvalidCharacter { char: char, offset: usize },

    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unknown phrase code {code} (dictionary size {size})")]
    UnknownPhrase { code: u32, size: usize },

    #[error("unexpected data after end-of-stream code at offset {offset}")]
    TrailingData { offset: usize },

    #[error("code width exceeds {max} bits")]
    CodeTooWide { max: u32 },

    #[error("invalid base64url payload: {0}")]
    InvalidBase64(String),

    #[error("inflate failed: {0}")]
    DecompressionFailed(String),

    #[error("{field} length exceeds maximum {max}")]
    LengthExceedsLimit { field: &'static str, max: usize },

    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,

    #[error("decoded units are not valid UTF-16")]
    InvalidUtf16,

    #[error("token matches no scheme (compact: {compact}; deflate: {deflate})")]
    Unrecognized {
        compact: Box<DecodeError>,
        deflate: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Returns the class of this error.
    ///
    /// For [`DecodeError::Unrecognized`] this is the class of the DEFLATE
    /// attempt, which is the last one tried.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::EmptyToken
            | DecodeError::EmptyPayload
            | DecodeError::InvalidCharacter { .. } => ErrorCode::Alphabet,
            DecodeError::UnexpectedEof { .. } => ErrorCode::Truncated,
            DecodeError::LengthExceedsLimit { .. } => ErrorCode::Limit,
            DecodeError::InvalidUtf8 | DecodeError::InvalidUtf16 => ErrorCode::Text,
            DecodeError::Unrecognized { deflate, .. } => deflate.code(),
            _ => ErrorCode::Corrupt,
        }
    }
}

/// Error while producing a token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("deflate compression failed: {0}")]
    CompressionFailed(String),

    #[error("payload serialization failed: {0}")]
    SerializationFailed(String),
}

/// Error while loading a document from a share token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("share token could not be decoded: {0}")]
    Undecodable(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}
