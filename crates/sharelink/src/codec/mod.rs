//! Share token encoding/decoding.
//!
//! Two schemes produce tokens: [`compact`] (untagged, LZ-string style) and
//! [`deflate`] (`gz:`-tagged DEFLATE + base64url). [`token`] chooses between
//! them.

pub mod bits;
pub mod compact;
pub mod deflate;
pub mod token;

pub use bits::{Alphabet, BitReader, BitWriter};
pub use deflate::DeflateFormat;
pub use token::{
    decode, decode_detailed, decode_with_options, encode, encode_with_options, CodecOptions,
    Decoded, Encoded, Scheme,
};
