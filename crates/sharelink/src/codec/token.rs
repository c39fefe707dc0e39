//! Share token encoding/decoding.
//!
//! Encoding runs both schemes and keeps the shorter token, preferring the
//! compact scheme on ties. Decoding tries the compact scheme first and falls
//! back to DEFLATE, with or without the `gz:` marker.

use tracing::debug;

use crate::codec::bits::Alphabet;
use crate::codec::compact;
use crate::codec::deflate::{self, DeflateFormat};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{compact_output_bound, deflate_output_bound, DEFAULT_DEFLATE_LEVEL};
use crate::validate::validate_token;

/// Compression scheme behind a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// LZ-string style dictionary compression, untagged.
    Compact,
    /// DEFLATE + base64url, tagged with `gz:`.
    Deflate,
}

impl Scheme {
    /// Returns a short stable name for the scheme.
    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Compact => "compact",
            Scheme::Deflate => "deflate",
        }
    }
}

/// Options for encoding and decoding tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// DEFLATE compression level, 0-9.
    pub level: u32,
    /// Container used when writing DEFLATE tokens. Decoding detects it.
    pub format: DeflateFormat,
    /// Fixed cap on decoded output. `None` bounds output by what the token's
    /// length allows, which accepts every token [`encode`] produces.
    pub max_decoded_len: Option<usize>,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_DEFLATE_LEVEL,
            format: DeflateFormat::default(),
            max_decoded_len: None,
        }
    }
}

impl CodecOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the DEFLATE compression level (clamped to 9).
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Sets the DEFLATE container.
    pub fn with_format(mut self, format: DeflateFormat) -> Self {
        self.format = format;
        self
    }

    /// Caps decoded output (UTF-16 units for compact tokens, bytes for
    /// DEFLATE tokens).
    pub fn with_max_decoded_len(mut self, max_decoded_len: usize) -> Self {
        self.max_decoded_len = Some(max_decoded_len);
        self
    }
}

/// A token together with the scheme that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub token: String,
    pub scheme: Scheme,
}

/// Recovered text together with the scheme that decoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub scheme: Scheme,
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes `text` into the shortest URL-safe token.
///
/// ```rust
/// let token = sharelink::encode("graph TD; A-->B;");
/// assert_eq!(sharelink::decode(&token).as_deref(), Some("graph TD; A-->B;"));
/// ```
pub fn encode(text: &str) -> String {
    encode_with_options(text, &CodecOptions::default()).token
}

/// Encodes `text` with explicit options, reporting the winning scheme.
///
/// A DEFLATE failure is not an error: the compact token is returned instead.
pub fn encode_with_options(text: &str, options: &CodecOptions) -> Encoded {
    shortest(compact::compress(text), deflate::compress(text, options))
}

fn shortest(compact: String, deflated: Result<String, EncodeError>) -> Encoded {
    match deflated {
        Ok(deflated) if deflated.len() < compact.len() => Encoded {
            token: deflated,
            scheme: Scheme::Deflate,
        },
        Ok(_) => Encoded {
            token: compact,
            scheme: Scheme::Compact,
        },
        Err(err) => {
            debug!(error = %err, "deflate candidate unavailable, keeping compact token");
            Encoded {
                token: compact,
                scheme: Scheme::Compact,
            }
        }
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a token, returning `None` if it cannot be recovered.
pub fn decode(token: &str) -> Option<String> {
    decode_with_options(token, &CodecOptions::default())
}

/// Decodes a token with explicit options, returning `None` on failure.
pub fn decode_with_options(token: &str, options: &CodecOptions) -> Option<String> {
    match decode_detailed(token, options) {
        Ok(decoded) => Some(decoded.text),
        Err(err) => {
            debug!(error = %err, code = err.code().as_str(), "share token rejected");
            None
        }
    }
}

/// Decodes a token, reporting the scheme used or why both schemes failed.
pub fn decode_detailed(token: &str, options: &CodecOptions) -> Result<Decoded, DecodeError> {
    validate_token(token)?;

    let compact_limit = options
        .max_decoded_len
        .unwrap_or_else(|| compact_output_bound(token.len()));
    let compact_err =
        match compact::decompress_with(token, Alphabet::UrlSafe, compact_limit) {
            Ok(text) => {
                return Ok(Decoded {
                    text,
                    scheme: Scheme::Compact,
                });
            }
            Err(err) => err,
        };
    debug!(error = %compact_err, "compact scheme rejected token, trying deflate");

    let deflate_limit = options
        .max_decoded_len
        .unwrap_or_else(|| deflate_output_bound(token.len()));
    match deflate::decompress(token, deflate_limit) {
        Ok(text) => Ok(Decoded {
            text,
            scheme: Scheme::Deflate,
        }),
        Err(deflate_err) => Err(DecodeError::Unrecognized {
            compact: Box::new(compact_err),
            deflate: Box::new(deflate_err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeated_lines() -> String {
        vec!["This is a line of mermaid diagram text to make it larger."; 500].join("\n")
    }

    fn expected_token(text: &str) -> String {
        let compact = compact::compress(text);
        let deflated = deflate::compress(text, &CodecOptions::default()).unwrap();
        if deflated.len() < compact.len() { deflated } else { compact }
    }

    #[test]
    fn test_small_diagram_roundtrip() {
        let text = "graph TD; A-->B;";
        let token = encode(text);
        assert_eq!(decode(&token).as_deref(), Some(text));
    }

    #[test]
    fn test_repetitive_text_shrinks() {
        let text = repeated_lines();
        assert!(text.len() > 28_000);

        let encoded = encode_with_options(&text, &CodecOptions::default());
        assert_eq!(encoded.scheme, Scheme::Deflate);
        assert!(encoded.token.len() * 20 < text.len(), "token length {}", encoded.token.len());
        assert_eq!(decode(&encoded.token), Some(text));
    }

    #[test]
    fn test_shortest_wins() {
        for text in ["", "a", "graph TD; A-->B;", "héllo wörld", &repeated_lines()] {
            assert_eq!(encode(text), expected_token(text), "input {:?}", text);
        }
    }

    #[test]
    fn test_short_text_prefers_compact() {
        let encoded = encode_with_options("graph TD; A-->B;", &CodecOptions::default());
        assert_eq!(encoded.scheme, Scheme::Compact);
        assert!(!encoded.token.starts_with("gz:"));
    }

    #[test]
    fn test_empty_text() {
        let token = encode("");
        assert!(!token.is_empty());
        assert_eq!(decode(&token).as_deref(), Some(""));
    }

    #[test]
    fn test_invalid_tokens_yield_none() {
        assert_eq!(decode("not-a-valid-token-@@@"), None);
        assert_eq!(decode("gz:"), None);
        assert_eq!(decode(""), None);
        assert_eq!(decode("has space"), None);
        assert_eq!(decode("gz:abc=="), None);
    }

    #[test]
    fn test_detailed_reports_scheme() {
        let options = CodecOptions::default();

        let compact_token = compact::compress("tiny");
        let decoded = decode_detailed(&compact_token, &options).unwrap();
        assert_eq!(decoded.scheme, Scheme::Compact);
        assert_eq!(decoded.text, "tiny");

        let deflate_token = deflate::compress("tiny", &options).unwrap();
        let decoded = decode_detailed(&deflate_token, &options).unwrap();
        assert_eq!(decoded.scheme, Scheme::Deflate);
        assert_eq!(decoded.text, "tiny");
    }

    #[test]
    fn test_detailed_error_for_garbage() {
        let options = CodecOptions::default();
        assert_eq!(decode_detailed("gz:", &options), Err(DecodeError::EmptyPayload));
        assert!(matches!(
            decode_detailed("abc@", &options),
            Err(DecodeError::InvalidCharacter { char: '@', offset: 3 })
        ));
        assert!(matches!(
            decode_detailed("gz:abcde", &options),
            Err(DecodeError::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_legacy_untagged_deflate_token() {
        let text = repeated_lines();
        let tagged = deflate::compress(&text, &CodecOptions::default()).unwrap();
        let untagged = tagged.strip_prefix("gz:").unwrap();
        assert_eq!(decode(untagged), Some(text));
    }

    #[test]
    fn test_options_are_respected() {
        let text = repeated_lines();
        let options = CodecOptions::new()
            .with_format(DeflateFormat::Gzip)
            .with_level(42)
            .with_max_decoded_len(100);
        assert_eq!(options.level, 9);

        let encoded = encode_with_options(&text, &options);
        assert_eq!(encoded.scheme, Scheme::Deflate);
        assert_eq!(decode_with_options(&encoded.token, &options), None);
        assert_eq!(decode(&encoded.token), Some(text));
    }

    #[test]
    fn test_default_decode_accepts_large_output() {
        let text = "graph TD; A-->B;\n".repeat(70_000);
        assert!(text.len() > 1 << 20);

        let encoded = encode_with_options(&text, &CodecOptions::default());
        assert!(encoded.token.len() < 8_000, "token length {}", encoded.token.len());
        assert_eq!(decode(&encoded.token), Some(text.clone()));

        let capped = CodecOptions::new().with_max_decoded_len(1 << 20);
        assert_eq!(decode_with_options(&encoded.token, &capped), None);
    }

    #[test]
    fn test_deflate_failure_keeps_compact() {
        let compact = compact::compress("graph TD; A-->B;");
        let failed = Err(EncodeError::CompressionFailed("sink closed".to_string()));
        assert_eq!(
            shortest(compact.clone(), failed),
            Encoded {
                token: compact,
                scheme: Scheme::Compact,
            }
        );
    }

    #[test]
    fn test_tie_prefers_compact() {
        let encoded = shortest("abcd".to_string(), Ok("gz:a".to_string()));
        assert_eq!(encoded.scheme, Scheme::Compact);
        let encoded = shortest("abcde".to_string(), Ok("gz:a".to_string()));
        assert_eq!(encoded.scheme, Scheme::Deflate);
    }
}
