//! Token shape validation.
//!
//! A well-formed token matches `^(gz:)?[A-Za-z0-9\-_]+$`. Anything else is
//! rejected before either scheme is attempted. Passing validation does not
//! mean a token decodes; it only means it could.

use crate::codec::Scheme;
use crate::error::DecodeError;
use crate::limits::DEFLATE_MARKER;

/// Structural facts about a well-formed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenShape {
    /// The token starts with the `gz:` marker.
    pub tagged: bool,
    /// Length of the token after the marker.
    pub payload_len: usize,
}

impl TokenShape {
    /// Scheme the token most likely came from.
    ///
    /// Untagged tokens are usually compact tokens, but legacy DEFLATE tokens
    /// were also written without the marker.
    pub fn likely_scheme(&self) -> Scheme {
        if self.tagged { Scheme::Deflate } else { Scheme::Compact }
    }
}

/// Returns true if `byte` may appear in a token payload.
#[inline]
pub fn is_token_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Checks that every character of `payload` is a token character.
///
/// Offsets in the error are shifted by `offset` so they point into the full
/// token.
pub fn check_payload(payload: &str, offset: usize) -> Result<(), DecodeError> {
    for (index, c) in payload.char_indices() {
        if !c.is_ascii() || !is_token_char(c as u8) {
            return Err(DecodeError::InvalidCharacter { char: c, offset: offset + index });
        }
    }
    Ok(())
}

/// Validates the token alphabet contract.
pub fn validate_token(token: &str) -> Result<TokenShape, DecodeError> {
    if token.is_empty() {
        return Err(DecodeError::EmptyToken);
    }
    let (tagged, payload) = match token.strip_prefix(DEFLATE_MARKER) {
        Some(payload) => (true, payload),
        None => (false, token),
    };
    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    check_payload(payload, token.len() - payload.len())?;
    Ok(TokenShape {
        tagged,
        payload_len: payload.len(),
    })
}
