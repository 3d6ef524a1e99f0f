// ABOUTME: Text coding registry mapping the SMPP data_coding tag byte to an Encoding implementation
// ABOUTME: Covers GSM7, ASCII, the ISO-8859 charmaps, UCS-2, and opaque binary placeholders

pub mod charmap;
pub mod gsm7;
pub mod ucs2;

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub use charmap::{Ascii, Binary8Bit1, Binary8Bit2, Cyrillic, Hebrew, Latin1};
pub use gsm7::Gsm7Bit;
pub use ucs2::Ucs2Be;

/// Errors produced by a [`Coding`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodingError {
    #[error("character {character:?} has no representation in {encoding}")]
    InvalidCharacter { character: char, encoding: &'static str },

    #[error("byte 0x{byte:02X} at offset {offset} is not valid in {encoding}")]
    InvalidByte {
        byte: u8,
        offset: usize,
        encoding: &'static str,
    },

    #[error("{encoding} does not implement encode")]
    NotImplementedEncode { encoding: &'static str },

    #[error("{encoding} does not implement decode")]
    NotImplementedDecode { encoding: &'static str },

    #[error("destination buffer too small for {encoding} output")]
    ShortDestination { encoding: &'static str },
}

/// A text coding identified by a one-byte `data_coding` tag.
pub trait Coding: Send + Sync {
    fn encode(&self, text: &str) -> Result<Bytes, CodingError>;
    fn decode(&self, bytes: &[u8]) -> Result<String, CodingError>;
    fn data_coding(&self) -> u8;
}

/// Extension for codings that can break long text into wire-sized segments.
pub trait Splitter: Coding {
    fn should_split(&self, text: &str, octet_limit: usize) -> bool;
    fn encode_split(&self, text: &str, octet_limit: usize) -> Result<Vec<Bytes>, CodingError>;
}

type EncodeFn = dyn Fn(&str) -> Result<Bytes, CodingError> + Send + Sync;
type DecodeFn = dyn Fn(&[u8]) -> Result<String, CodingError> + Send + Sync;

/// Wraps a pair of plain functions as a [`Coding`], so callers can register
/// proprietary data codings without touching [`CodingRegistry`] itself.
pub struct CustomCoding {
    tag: u8,
    encode_fn: Box<EncodeFn>,
    decode_fn: Box<DecodeFn>,
}

impl CustomCoding {
    pub fn new(
        tag: u8,
        encode_fn: impl Fn(&str) -> Result<Bytes, CodingError> + Send + Sync + 'static,
        decode_fn: impl Fn(&[u8]) -> Result<String, CodingError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            tag,
            encode_fn: Box::new(encode_fn),
            decode_fn: Box::new(decode_fn),
        }
    }
}

impl Coding for CustomCoding {
    fn encode(&self, text: &str) -> Result<Bytes, CodingError> {
        (self.encode_fn)(text)
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodingError> {
        (self.decode_fn)(bytes)
    }

    fn data_coding(&self) -> u8 {
        self.tag
    }
}

/// Maps a `data_coding` tag byte to the [`Coding`] that handles it.
///
/// `CodingRegistry::new()` pre-populates the eight standard SMPP codings;
/// additional tags (including [`CustomCoding`] wrappers) can be layered in
/// with [`CodingRegistry::register`].
pub struct CodingRegistry {
    codings: HashMap<u8, Arc<dyn Coding>>,
}

impl CodingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            codings: HashMap::new(),
        };
        registry.register(Arc::new(Gsm7Bit::packed()));
        registry.register(Arc::new(Ascii));
        registry.register(Arc::new(Binary8Bit1));
        registry.register(Arc::new(Latin1));
        registry.register(Arc::new(Binary8Bit2));
        registry.register(Arc::new(Cyrillic));
        registry.register(Arc::new(Hebrew));
        registry.register(Arc::new(Ucs2Be));
        registry
    }

    /// Registers (or overwrites) the handler for `coding.data_coding()`.
    pub fn register(&mut self, coding: Arc<dyn Coding>) {
        self.codings.insert(coding.data_coding(), coding);
    }

    pub fn get(&self, tag: u8) -> Option<Arc<dyn Coding>> {
        self.codings.get(&tag).cloned()
    }

    pub fn is_registered(&self, tag: u8) -> bool {
        self.codings.contains_key(&tag)
    }
}

impl Default for CodingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks GSM7 when every character in `text` is representable in that alphabet,
/// falling back to UCS-2 big-endian otherwise.
pub fn best_safe_coding(text: &str) -> (u8, Arc<dyn Splitter>) {
    if gsm7::Gsm7Bit::validate_string(text).is_empty() {
        (0x00, Arc::new(Gsm7Bit::packed()))
    } else {
        (0x08, Arc::new(Ucs2Be))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_round_trips_tag_byte() {
        let registry = CodingRegistry::new();
        for tag in [0x00u8, 0x01, 0x02, 0x03, 0x04, 0x06, 0x07, 0x08] {
            let coding = registry.get(tag).unwrap_or_else(|| panic!("tag {tag:#x} missing"));
            assert_eq!(coding.data_coding(), tag);
        }
    }

    #[test]
    fn unregistered_tag_is_absent() {
        let registry = CodingRegistry::new();
        assert!(registry.get(0x05).is_none());
        assert!(!registry.is_registered(0x05));
    }

    #[test]
    fn custom_coding_registers_under_its_own_tag() {
        let mut registry = CodingRegistry::new();
        registry.register(Arc::new(CustomCoding::new(
            0x90,
            |text| Ok(Bytes::from(text.as_bytes().to_vec())),
            |bytes| Ok(String::from_utf8_lossy(bytes).into_owned()),
        )));
        let coding = registry.get(0x90).unwrap();
        let encoded = coding.encode("hi").unwrap();
        assert_eq!(coding.decode(&encoded).unwrap(), "hi");
    }

    #[test]
    fn best_safe_coding_prefers_gsm7() {
        let (tag, _) = best_safe_coding("hello world");
        assert_eq!(tag, 0x00);
    }

    #[test]
    fn best_safe_coding_falls_back_to_ucs2() {
        let (tag, _) = best_safe_coding("你好");
        assert_eq!(tag, 0x08);
    }
}
