//! Bit-level reading and writing over a 6-bit character alphabet.
//!
//! Values are written least-significant bit first and packed into characters
//! most-significant bit first, which is the layout LZ-string uses.

use lazy_static::lazy_static;

use crate::error::DecodeError;
use crate::limits::{BITS_PER_CHAR, LEGACY_URI_ALPHABET, URL_SAFE_ALPHABET};

const NOT_IN_ALPHABET: u8 = 0xFF;

lazy_static! {
    static ref URL_SAFE_REVERSE: [u8; 256] = reverse_table(URL_SAFE_ALPHABET);
    static ref LEGACY_URI_REVERSE: [u8; 256] = reverse_table(LEGACY_URI_ALPHABET);
}

fn reverse_table(symbols: &[u8; 64]) -> [u8; 256] {
    let mut table = [NOT_IN_ALPHABET; 256];
    for (value, &symbol) in symbols.iter().enumerate() {
        table[symbol as usize] = value as u8;
    }
    table
}

/// Character set used to carry 6-bit groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alphabet {
    /// `A-Z a-z 0-9 - _`, identical to base64url.
    #[default]
    UrlSafe,
    /// `A-Z a-z 0-9 + -`, the stock LZ-string URI component alphabet.
    LegacyUri,
}

impl Alphabet {
    /// Returns the 64 symbols in value order.
    pub fn symbols(&self) -> &'static [u8; 64] {
        match self {
            Alphabet::UrlSafe => URL_SAFE_ALPHABET,
            Alphabet::LegacyUri => LEGACY_URI_ALPHABET,
        }
    }

    /// Returns the symbol for the low 6 bits of `value`.
    #[inline]
    pub fn symbol(&self, value: u32) -> char {
        self.symbols()[(value & 0x3F) as usize] as char
    }

    /// Returns the 6-bit value of a symbol, or `None` if it is not in the alphabet.
    #[inline]
    pub fn value_of(&self, byte: u8) -> Option<u8> {
        let table: &[u8; 256] = match self {
            Alphabet::UrlSafe => &*URL_SAFE_REVERSE,
            Alphabet::LegacyUri => &*LEGACY_URI_REVERSE,
        };
        match table[byte as usize] {
            NOT_IN_ALPHABET => None,
            value => Some(value),
        }
    }

    /// Checks every character of `input`, reporting the first foreign one.
    pub fn check(&self, input: &str) -> Result<(), DecodeError> {
        for (offset, c) in input.char_indices() {
            if !c.is_ascii() || self.value_of(c as u8).is_none() {
                return Err(DecodeError::InvalidCharacter { char: c, offset });
            }
        }
        Ok(())
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Reader that yields bits from a token.
///
/// Reading past the last character yields zero bits; callers detect the end
/// with [`BitReader::is_exhausted`].
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    input: &'a [u8],
    alphabet: Alphabet,
    value: u32,
    position: u32,
    index: usize,
}

impl<'a> BitReader<'a> {
    const RESET: u32 = 1 << (BITS_PER_CHAR - 1);

    /// Creates a reader, rejecting input with characters outside `alphabet`.
    pub fn new(input: &'a str, alphabet: Alphabet) -> Result<Self, DecodeError> {
        alphabet.check(input)?;
        let mut reader = Self {
            input: input.as_bytes(),
            alphabet,
            value: 0,
            position: Self::RESET,
            index: 0,
        };
        reader.value = reader.value_at(0);
        reader.index = 1;
        Ok(reader)
    }

    fn value_at(&self, index: usize) -> u32 {
        self.input
            .get(index)
            .and_then(|&byte| self.alphabet.value_of(byte))
            .map_or(0, u32::from)
    }

    /// Returns true once the reader has moved beyond the last character.
    pub fn is_exhausted(&self) -> bool {
        self.index > self.input.len()
    }

    /// Returns true if nothing but zero padding follows the bits read so far.
    pub fn is_clean_end(&self) -> bool {
        self.index >= self.input.len() && self.value & ((self.position << 1) - 1) == 0
    }

    /// Offset of the character currently being read.
    pub fn offset(&self) -> usize {
        self.index - 1
    }

    /// Reads a `width`-bit value, least-significant bit first.
    #[inline]
    pub fn read_bits(&mut self, width: u32) -> u32 {
        let mut bits = 0u32;
        for shift in 0..width {
            let set = self.value & self.position != 0;
            self.position >>= 1;
            if self.position == 0 {
                self.position = Self::RESET;
                self.value = self.value_at(self.index);
                self.index += 1;
            }
            if set {
                bits |= 1 << shift;
            }
        }
        bits
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer that packs bits into token characters.
#[derive(Debug, Clone)]
pub struct BitWriter {
    out: String,
    alphabet: Alphabet,
    value: u32,
    position: u32,
}

impl BitWriter {
    /// Creates a new writer.
    pub fn new(alphabet: Alphabet) -> Self {
        Self::with_capacity(alphabet, 0)
    }

    /// Creates a new writer with capacity for `capacity` characters.
    pub fn with_capacity(alphabet: Alphabet, capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            alphabet,
            value: 0,
            position: 0,
        }
    }

    /// Returns the number of complete characters written.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Returns true if no complete character has been written.
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Writes the low `width` bits of `value`, least-significant bit first.
    #[inline]
    pub fn write_bits(&mut self, mut value: u32, width: u32) {
        for _ in 0..width {
            self.value = (self.value << 1) | (value & 1);
            if self.position == BITS_PER_CHAR - 1 {
                self.position = 0;
                self.out.push(self.alphabet.symbol(self.value));
                self.value = 0;
            } else {
                self.position += 1;
            }
            value >>= 1;
        }
    }

    /// Pads the pending character with zero bits and returns the token.
    ///
    /// A padding character is always emitted, even when the written bits
    /// ended on a character boundary.
    pub fn finish(mut self) -> String {
        loop {
            self.value <<= 1;
            if self.position == BITS_PER_CHAR - 1 {
                self.out.push(self.alphabet.symbol(self.value));
                break;
            }
            self.position += 1;
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_roundtrip() {
        let values = [(0u32, 2u32), (2, 2), (97, 8), (0xFFFF, 16), (5, 3), (1 << 20, 21)];

        let mut writer = BitWriter::new(Alphabet::UrlSafe);
        for (value, width) in values {
            writer.write_bits(value, width);
        }
        let token = writer.finish();

        let mut reader = BitReader::new(&token, Alphabet::UrlSafe).unwrap();
        for (value, width) in values {
            assert_eq!(reader.read_bits(width), value, "width {}", width);
        }
    }

    #[test]
    fn test_end_marker_packs_to_single_char() {
        let mut writer = BitWriter::new(Alphabet::UrlSafe);
        writer.write_bits(2, 2);
        assert!(writer.is_empty());
        assert_eq!(writer.finish(), "Q");
    }

    #[test]
    fn test_finish_pads_on_boundary() {
        let mut writer = BitWriter::new(Alphabet::UrlSafe);
        writer.write_bits(0x3F, 6);
        assert_eq!(writer.len(), 1);
        assert_eq!(writer.finish(), "_A");
    }

    #[test]
    fn test_reader_rejects_foreign_chars() {
        let err = BitReader::new("abc+def", Alphabet::UrlSafe).unwrap_err();
        assert_eq!(err, DecodeError::InvalidCharacter { char: '+', offset: 3 });

        assert!(BitReader::new("abc+def", Alphabet::LegacyUri).is_ok());
        assert!(BitReader::new("abc_def", Alphabet::LegacyUri).is_err());
        assert!(BitReader::new("héllo", Alphabet::UrlSafe).is_err());
    }

    #[test]
    fn test_reader_exhaustion() {
        let mut reader = BitReader::new("A", Alphabet::UrlSafe).unwrap();
        assert!(!reader.is_exhausted());
        assert_eq!(reader.read_bits(6), 0);
        assert!(reader.is_exhausted());
        assert_eq!(reader.read_bits(12), 0);
    }

    #[test]
    fn test_clean_end() {
        // 'Q' carries 0b010000: two bits of data then zero padding.
        let mut reader = BitReader::new("Q", Alphabet::UrlSafe).unwrap();
        assert_eq!(reader.read_bits(2), 2);
        assert!(reader.is_clean_end());

        // 'R' leaves a set bit behind.
        let mut reader = BitReader::new("R", Alphabet::UrlSafe).unwrap();
        assert_eq!(reader.read_bits(2), 2);
        assert!(!reader.is_clean_end());

        // More characters follow.
        let mut reader = BitReader::new("QA", Alphabet::UrlSafe).unwrap();
        assert_eq!(reader.read_bits(2), 2);
        assert!(!reader.is_clean_end());
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn test_alphabets_differ_only_in_last_symbols() {
        let url = Alphabet::UrlSafe.symbols();
        let legacy = Alphabet::LegacyUri.symbols();
        assert_eq!(url[..62], legacy[..62]);
        assert_eq!(Alphabet::UrlSafe.value_of(b'-'), Some(62));
        assert_eq!(Alphabet::LegacyUri.value_of(b'-'), Some(63));
        assert_eq!(Alphabet::UrlSafe.value_of(b'='), None);
    }
}
