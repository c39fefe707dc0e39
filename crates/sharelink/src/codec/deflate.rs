//! DEFLATE scheme: compressed UTF-8 bytes, base64url, `gz:` marker.
//!
//! Decoding sniffs the container from the first bytes (gzip magic, a valid
//! zlib header, otherwise raw DEFLATE), so tokens written with any of the
//! three containers decode.

use std::io::{Read, Write};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;
use tracing::debug;

use crate::codec::CodecOptions;
use crate::error::{DecodeError, EncodeError};
use crate::limits::DEFLATE_MARKER;
use crate::validate::check_payload;

/// Container wrapped around the DEFLATE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeflateFormat {
    /// RFC 1950: 2-byte header, Adler-32 trailer.
    #[default]
    Zlib,
    /// RFC 1951: bare DEFLATE blocks.
    Raw,
    /// RFC 1952: gzip member with a zeroed timestamp.
    Gzip,
}

impl DeflateFormat {
    /// Guesses the container from the leading bytes of `bytes`.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0x1f, 0x8b, ..] => DeflateFormat::Gzip,
            [cmf, flg, ..] if is_zlib_header(*cmf, *flg) => DeflateFormat::Zlib,
            _ => DeflateFormat::Raw,
        }
    }
}

fn is_zlib_header(cmf: u8, flg: u8) -> bool {
    // Method 8 (deflate), window <= 32K, no preset dictionary, check bits.
    cmf & 0x0f == 8 && cmf >> 4 <= 7 && flg & 0x20 == 0 && ((u16::from(cmf) << 8) | u16::from(flg)) % 31 == 0
}

// =============================================================================
// ENCODING
// =============================================================================

/// Compresses `text` into a `gz:`-tagged token.
pub fn compress(text: &str, options: &CodecOptions) -> Result<String, EncodeError> {
    let bytes = deflate_bytes(text.as_bytes(), options.format, options.level)?;

    let mut token = String::with_capacity(DEFLATE_MARKER.len() + bytes.len().div_ceil(3) * 4);
    token.push_str(DEFLATE_MARKER);
    URL_SAFE_NO_PAD.encode_string(&bytes, &mut token);
    Ok(token)
}

fn deflate_bytes(input: &[u8], format: DeflateFormat, level: u32) -> Result<Vec<u8>, EncodeError> {
    let level = Compression::new(level.min(9));
    let result = match format {
        DeflateFormat::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), level);
            encoder.write_all(input).and_then(|()| encoder.finish())
        }
        DeflateFormat::Raw => {
            let mut encoder = DeflateEncoder::new(Vec::new(), level);
            encoder.write_all(input).and_then(|()| encoder.finish())
        }
        DeflateFormat::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), level);
            encoder.write_all(input).and_then(|()| encoder.finish())
        }
    };
    result.map_err(|e| EncodeError::CompressionFailed(e.to_string()))
}

// =============================================================================
// DECODING
// =============================================================================

/// Decompresses a DEFLATE token.
///
/// The `gz:` marker is optional. `max_len` bounds the inflated payload in
/// bytes.
pub fn decompress(token: &str, max_len: usize) -> Result<String, DecodeError> {
    let payload = token.strip_prefix(DEFLATE_MARKER).unwrap_or(token);
    if payload.is_empty() {
        return Err(if token.is_empty() {
            DecodeError::EmptyToken
        } else {
            DecodeError::EmptyPayload
        });
    }
    check_payload(payload, token.len() - payload.len())?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
    let inflated = inflate(&bytes, max_len)?;
    String::from_utf8(inflated).map_err(|_| DecodeError::InvalidUtf8)
}

/// Inflates `bytes`, trying the sniffed container and then raw DEFLATE.
pub fn inflate(bytes: &[u8], max_len: usize) -> Result<Vec<u8>, DecodeError> {
    let format = DeflateFormat::detect(bytes);
    let sniffed = match format {
        DeflateFormat::Gzip => read_bounded(GzDecoder::new(bytes), max_len),
        DeflateFormat::Zlib => read_bounded(ZlibDecoder::new(bytes), max_len),
        DeflateFormat::Raw => return read_bounded(DeflateDecoder::new(bytes), max_len),
    };
    match sniffed {
        Err(err @ DecodeError::DecompressionFailed(_)) => {
            debug!(?format, error = %err, "container header did not hold, retrying as raw deflate");
            read_bounded(DeflateDecoder::new(bytes), max_len).map_err(|_| err)
        }
        other => other,
    }
}

fn read_bounded<R: Read>(decoder: R, max_len: usize) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    decoder
        .take((max_len as u64).saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;
    if out.len() > max_len {
        return Err(DecodeError::LengthExceedsLimit {
            field: "inflated payload",
            max: max_len,
        });
    }
    Ok(out)
}
