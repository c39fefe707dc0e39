//! Constants and limits for share tokens.
//!
//! Decoding accepts untrusted input from URLs, so every decompression path is
//! bounded. By default the bound is the most a token of the given length can
//! legitimately expand to ([`compact_output_bound`], [`deflate_output_bound`]),
//! so anything [`encode`](crate::encode) emits decodes. Callers can set a fixed
//! cap through [`CodecOptions`](crate::codec::CodecOptions).

/// Marker prepended to tokens produced by the DEFLATE scheme.
pub const DEFLATE_MARKER: &str = "gz:";

/// Token alphabet shared by the compact scheme and base64url.
pub const URL_SAFE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Stock LZ-string `compressToEncodedURIComponent` alphabet.
///
/// Links minted by earlier versions of the editor use this alphabet. It is
/// never produced by [`encode`](crate::encode).
pub const LEGACY_URI_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+-";

/// Bits carried by each token character.
pub const BITS_PER_CHAR: u32 = 6;

/// Most bytes a single compressed DEFLATE byte can expand to: a 258-byte
/// match coded in two bits.
pub const DEFLATE_MAX_RATIO: usize = 1032;

/// Widest dictionary code the compact decoder will read.
pub const MAX_CODE_BITS: u32 = 32;

/// Default DEFLATE compression level.
pub const DEFAULT_DEFLATE_LEVEL: u32 = 9;

/// Recommended ceiling for a full share URL, in characters.
///
/// Browsers and chat clients start truncating somewhere past this.
pub const RECOMMENDED_URL_LEN: usize = 32 * 1024;

/// Upper bound on the UTF-16 units a compact token of `token_len` characters
/// decodes to.
///
/// The n-th code read is at most n + 1 units long, and code widths follow the
/// decoder schedule (4 codes of 3 bits, 8 of 4 bits, ...).
pub fn compact_output_bound(token_len: usize) -> usize {
    let mut bits = token_len.saturating_mul(BITS_PER_CHAR as usize) as u128;
    let mut codes: u128 = 0;
    let mut total: u128 = 1;
    let mut width = 3u32;
    let mut run: u128 = 4;

    while width <= MAX_CODE_BITS && bits >= u128::from(width) {
        let count = run.min(bits / u128::from(width));
        let (shortest, longest) = (codes + 2, codes + count + 1);
        total += count * (shortest + longest) / 2;
        codes += count;
        bits -= count * u128::from(width);
        run = 1 << width;
        width += 1;
    }
    usize::try_from(total).unwrap_or(usize::MAX)
}

/// Upper bound on the bytes a DEFLATE payload of `payload_len` base64url
/// characters inflates to.
pub fn deflate_output_bound(payload_len: usize) -> usize {
    let bytes = payload_len.saturating_mul(6).div_ceil(8);
    bytes.saturating_mul(DEFLATE_MAX_RATIO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_bound_small_tokens() {
        assert_eq!(compact_output_bound(0), 1);
        assert_eq!(compact_output_bound(1), 6);
        assert_eq!(compact_output_bound(3), 21);
    }

    #[test]
    fn test_compact_bound_grows_quadratically() {
        // A run of one repeated unit adds one unit per phrase, which the
        // bound must cover.
        let short = compact_output_bound(100);
        let long = compact_output_bound(1000);
        assert_eq!((short, long), (5151, 244_650));
        assert!(compact_output_bound(usize::MAX) > long);
    }

    #[test]
    fn test_deflate_bound() {
        assert_eq!(deflate_output_bound(0), 0);
        assert_eq!(deflate_output_bound(4), 3 * DEFLATE_MAX_RATIO);
        assert_eq!(deflate_output_bound(5), 4 * DEFLATE_MAX_RATIO);
        assert_eq!(deflate_output_bound(usize::MAX), usize::MAX);
    }
}
