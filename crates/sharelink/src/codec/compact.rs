//! Compact scheme: LZ-string style dictionary compression.
//!
//! Text is processed as UTF-16 code units. Phrases are assigned growing
//! dictionary codes; codes 0 and 1 introduce 8-bit and 16-bit literals and
//! code 2 ends the stream. The bit stream is carried by a 6-bit alphabet, so
//! the output is URL-safe without further escaping.
//!
//! With [`Alphabet::LegacyUri`] the output is byte-for-byte what LZ-string's
//! `compressToEncodedURIComponent` produces.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::codec::bits::{Alphabet, BitReader, BitWriter};
use crate::error::DecodeError;
use crate::limits::{compact_output_bound, MAX_CODE_BITS};

const LITERAL_8: u32 = 0;
const LITERAL_16: u32 = 1;
const END_OF_STREAM: u32 = 2;
const FIRST_PHRASE: u32 = 3;

// =============================================================================
// ENCODING
// =============================================================================

/// Compresses `text` into a URL-safe token.
pub fn compress(text: &str) -> String {
    compress_with(text, Alphabet::UrlSafe)
}

/// Compresses `text` using the given output alphabet.
pub fn compress_with(text: &str, alphabet: Alphabet) -> String {
    let mut compressor = Compressor::new(alphabet, text.len());
    for unit in text.encode_utf16() {
        compressor.push(unit);
    }
    compressor.finish()
}

#[derive(Debug, Clone, Copy)]
enum Phrase {
    /// A single code unit and its dictionary code.
    Unit(u16, u32),
    /// A multi-unit phrase already in the dictionary.
    Run(u32),
}

impl Phrase {
    fn code(&self) -> u32 {
        match *self {
            Phrase::Unit(_, code) | Phrase::Run(code) => code,
        }
    }
}

struct Compressor {
    writer: BitWriter,
    units: FxHashMap<u16, u32>,
    runs: FxHashMap<(u32, u16), u32>,
    /// Units with a code assigned whose literal has not been written yet.
    pending: FxHashSet<u16>,
    current: Option<Phrase>,
    next_code: u32,
    width: u32,
    enlarge_in: u64,
}

impl Compressor {
    fn new(alphabet: Alphabet, size_hint: usize) -> Self {
        Self {
            writer: BitWriter::with_capacity(alphabet, size_hint / 2 + 1),
            units: FxHashMap::default(),
            runs: FxHashMap::default(),
            pending: FxHashSet::default(),
            current: None,
            next_code: FIRST_PHRASE,
            width: 2,
            enlarge_in: 2,
        }
    }

    fn allocate(&mut self) -> u32 {
        let code = self.next_code;
        self.next_code += 1;
        code
    }

    fn push(&mut self, unit: u16) {
        let unit_code = match self.units.get(&unit) {
            Some(&code) => code,
            None => {
                let code = self.allocate();
                self.units.insert(unit, code);
                self.pending.insert(unit);
                code
            }
        };

        let Some(phrase) = self.current else {
            self.current = Some(Phrase::Unit(unit, unit_code));
            return;
        };

        if let Some(&code) = self.runs.get(&(phrase.code(), unit)) {
            self.current = Some(Phrase::Run(code));
            return;
        }

        self.emit(phrase);
        self.tick();
        let code = self.allocate();
        self.runs.insert((phrase.code(), unit), code);
        self.current = Some(Phrase::Unit(unit, unit_code));
    }

    fn emit(&mut self, phrase: Phrase) {
        match phrase {
            Phrase::Unit(unit, _) if self.pending.remove(&unit) => {
                if unit < 256 {
                    self.writer.write_bits(LITERAL_8, self.width);
                    self.writer.write_bits(u32::from(unit), 8);
                } else {
                    self.writer.write_bits(LITERAL_16, self.width);
                    self.writer.write_bits(u32::from(unit), 16);
                }
                self.tick();
            }
            _ => self.writer.write_bits(phrase.code(), self.width),
        }
    }

    /// Counts down to the next code width increase.
    fn tick(&mut self) {
        self.enlarge_in -= 1;
        if self.enlarge_in == 0 {
            self.enlarge_in = 1 << self.width;
            self.width += 1;
        }
    }

    fn finish(mut self) -> String {
        if let Some(phrase) = self.current.take() {
            self.emit(phrase);
            self.tick();
        }
        self.writer.write_bits(END_OF_STREAM, self.width);
        self.writer.finish()
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decompresses a URL-safe compact token.
///
/// Output is bounded by [`compact_output_bound`], which every token
/// [`compress`] produces satisfies.
pub fn decompress(token: &str) -> Result<String, DecodeError> {
    decompress_with(token, Alphabet::UrlSafe, compact_output_bound(token.len()))
}

/// Decompresses a compact token written in `alphabet`.
///
/// `max_len` bounds the output in UTF-16 code units.
pub fn decompress_with(token: &str, alphabet: Alphabet, max_len: usize) -> Result<String, DecodeError> {
    if token.is_empty() {
        return Err(DecodeError::EmptyToken);
    }
    let mut reader = BitReader::new(token, alphabet)?;

    let first = match reader.read_bits(2) {
        LITERAL_8 => reader.read_bits(8) as u16,
        LITERAL_16 => reader.read_bits(16) as u16,
        END_OF_STREAM => return finish(&reader, &[]),
        code => return Err(DecodeError::UnknownPhrase { code, size: FIRST_PHRASE as usize }),
    };

    let mut dictionary = Dictionary::new();
    let mut out: Vec<u16> = Vec::with_capacity(token.len() * 2);
    let mut previous = dictionary.push_unit(first);
    dictionary.append(previous, &mut out, max_len)?;

    let mut width = 3u32;
    let mut enlarge_in = 4u64;

    loop {
        if reader.is_exhausted() {
            return Err(DecodeError::UnexpectedEof { context: "end-of-stream code" });
        }
        if width > MAX_CODE_BITS {
            return Err(DecodeError::CodeTooWide { max: MAX_CODE_BITS });
        }

        let code = match reader.read_bits(width) {
            LITERAL_8 => {
                enlarge_in -= 1;
                dictionary.push_unit(reader.read_bits(8) as u16)
            }
            LITERAL_16 => {
                enlarge_in -= 1;
                dictionary.push_unit(reader.read_bits(16) as u16)
            }
            END_OF_STREAM => return finish(&reader, &out),
            code => code as usize,
        };

        if enlarge_in == 0 {
            enlarge_in = 1 << width;
            width += 1;
        }

        // A code one past the dictionary refers to the phrase being defined
        // by this very step: previous + first unit of previous.
        let defined_here = code == dictionary.len();
        if defined_here {
            let head = dictionary.first_unit(previous);
            dictionary.push_run(previous, head);
        } else if code > dictionary.len() {
            return Err(DecodeError::UnknownPhrase {
                code: code as u32,
                size: dictionary.len(),
            });
        }

        dictionary.append(code, &mut out, max_len)?;
        if !defined_here {
            let head = dictionary.first_unit(code);
            dictionary.push_run(previous, head);
        }
        enlarge_in -= 1;
        previous = code;

        if enlarge_in == 0 {
            enlarge_in = 1 << width;
            width += 1;
        }
    }
}

/// Checks the stream trailer and converts the decoded units.
///
/// Only zero padding may follow the end-of-stream code. This keeps untagged
/// DEFLATE payloads, whose base64 often starts with a character that reads as
/// an immediate end-of-stream, from decoding as empty compact tokens.
fn finish(reader: &BitReader<'_>, out: &[u16]) -> Result<String, DecodeError> {
    if !reader.is_clean_end() {
        return Err(DecodeError::TrailingData { offset: reader.offset() });
    }
    String::from_utf16(out).map_err(|_| DecodeError::InvalidUtf16)
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    prefix: Option<usize>,
    unit: u16,
    first: u16,
    len: usize,
}

/// Decoder dictionary storing each phrase as (prefix code, last unit).
struct Dictionary {
    entries: Vec<Entry>,
}

impl Dictionary {
    fn new() -> Self {
        let reserved = Entry { prefix: None, unit: 0, first: 0, len: 0 };
        Self {
            entries: vec![reserved; FIRST_PHRASE as usize],
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn first_unit(&self, code: usize) -> u16 {
        self.entries[code].first
    }

    fn push_unit(&mut self, unit: u16) -> usize {
        self.entries.push(Entry { prefix: None, unit, first: unit, len: 1 });
        self.entries.len() - 1
    }

    fn push_run(&mut self, prefix: usize, unit: u16) -> usize {
        let base = self.entries[prefix];
        self.entries.push(Entry {
            prefix: Some(prefix),
            unit,
            first: base.first,
            len: base.len + 1,
        });
        self.entries.len() - 1
    }

    /// Appends the phrase for `code` to `out`, walking prefixes backwards.
    fn append(&self, code: usize, out: &mut Vec<u16>, max_len: usize) -> Result<(), DecodeError> {
        let len = self.entries[code].len;
        if out.len() + len > max_len {
            return Err(DecodeError::LengthExceedsLimit { field: "decoded text", max: max_len });
        }
        let start = out.len();
        out.resize(start + len, 0);
        let mut slot = start + len;
        let mut cursor = Some(code);
        while let Some(index) = cursor {
            let entry = self.entries[index];
            slot -= 1;
            out[slot] = entry.unit;
            cursor = entry.prefix;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert_eq!(compress(""), "Q");
        assert_eq!(decompress("Q").unwrap(), "");
    }

    #[test]
    fn test_single_char_layout() {
        // literal marker (2 bits), 'a' (8 bits), end marker (2 bits), padding
        assert_eq!(compress("a"), "IZA");
        assert_eq!(decompress("IZA").unwrap(), "a");
    }

    #[test]
    fn test_roundtrip() {
        let samples = [
            "graph TD; A-->B;",
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "abababababababababab",
            "embedded\0nul\0bytes",
            "unicode: \u{00e9}\u{4e2d}\u{6587} \u{1F600}\u{1F680}",
            "\u{FFFF}\u{0100}\u{00FF}",
        ];
        for s in samples {
            let token = compress(s);
            assert_eq!(decompress(&token).unwrap(), s, "token {}", token);
        }
    }

    #[test]
    fn test_legacy_alphabet_roundtrip() {
        let s = "sequenceDiagram\n    Alice->>Bob: Hello Bob, how are you?";
        let token = compress_with(s, Alphabet::LegacyUri);
        assert!(!token.contains('_'));
        assert_eq!(
            decompress_with(&token, Alphabet::LegacyUri, compact_output_bound(token.len())).unwrap(),
            s
        );
    }

    #[test]
    fn test_output_alphabet() {
        let token = compress(&"\u{1F600} mixed ~!@#$%^&*() text ".repeat(40));
        assert!(token.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[test]
    fn test_rejects_empty_and_foreign() {
        assert_eq!(decompress(""), Err(DecodeError::EmptyToken));
        assert!(matches!(
            decompress("gz:abc"),
            Err(DecodeError::InvalidCharacter { char: ':', offset: 2 })
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let s = "a reasonably long line of text to truncate";
        let token = compress(s);
        let truncated = &token[..token.len() / 2];
        assert_ne!(decompress(truncated).ok().as_deref(), Some(s));
    }

    #[test]
    fn test_trailing_data_rejected() {
        let token = compress("trailer");
        assert!(matches!(
            decompress(&format!("{}A", token)),
            Err(DecodeError::TrailingData { .. })
        ));
        // base64 of a zlib stream: 'e' reads as an immediate end-of-stream.
        assert!(matches!(
            decompress("eNorSS0uAQAEXQHB"),
            Err(DecodeError::TrailingData { offset: 0 })
        ));
    }

    #[test]
    fn test_unknown_first_code() {
        // First two bits read as 3.
        assert!(matches!(
            decompress("w"),
            Err(DecodeError::UnknownPhrase { code: 3, .. })
        ));
    }

    #[test]
    fn test_output_limit() {
        let s = "x".repeat(5000);
        let token = compress(&s);
        assert!(matches!(
            decompress_with(&token, Alphabet::UrlSafe, 100),
            Err(DecodeError::LengthExceedsLimit { max: 100, .. })
        ));
        assert_eq!(decompress_with(&token, Alphabet::UrlSafe, 5000).unwrap(), s);
    }

    #[test]
    fn test_long_single_unit_run() {
        // Phrase lengths grow by one per code, the densest a token gets.
        let s = "a".repeat(2_000_000);
        let token = compress(&s);
        assert!(token.len() < 10_000, "token length {}", token.len());
        assert!(compact_output_bound(token.len()) >= s.len());
        assert_eq!(decompress(&token).unwrap(), s);
    }

    #[test]
    fn test_stock_uri_component_links() {
        // Links produced by LZString.compressToEncodedURIComponent.
        assert_eq!(
            decompress_with("BIUwNmD2A0AEDukBOYAmBCIA", Alphabet::LegacyUri, 1000).unwrap(),
            "Hello, world!"
        );
        assert_eq!(
            decompress_with(
                "M4UwjgriB2DGIBECWBDA5gJxQWwFAAJD8BBAGyXgFoA+agIQHsAjALnwAkkg",
                Alphabet::LegacyUri,
                1000
            )
            .unwrap(),
            "sequenceDiagram\n    Alice->>Bob: Hi"
        );
        assert_eq!(
            compress_with("sequenceDiagram\n    Alice->>Bob: Hi", Alphabet::LegacyUri),
            "M4UwjgriB2DGIBECWBDA5gJxQWwFAAJD8BBAGyXgFoA+agIQHsAjALnwAkkg"
        );
    }
}
