// ABOUTME: UCS-2 big-endian coding (implemented as big-endian UTF-16, no byte-order mark)

use crate::coding::{Coding, CodingError, Splitter};
use bytes::{BufMut, Bytes, BytesMut};

const DEFAULT_SPLIT_LIMIT: usize = 134;

/// UCS-2, big-endian, no BOM. Code points outside the BMP are represented as
/// the UTF-16 surrogate pair, matching how most SMSCs treat "UCS-2".
pub struct Ucs2Be;

impl Coding for Ucs2Be {
    fn encode(&self, text: &str) -> Result<Bytes, CodingError> {
        let mut out = BytesMut::with_capacity(text.len() * 2);
        for unit in text.encode_utf16() {
            out.put_u16(unit);
        }
        Ok(out.freeze())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodingError> {
        if bytes.len() % 2 != 0 {
            return Err(CodingError::InvalidByte {
                byte: bytes[bytes.len() - 1],
                offset: bytes.len() - 1,
                encoding: "UCS2BE",
            });
        }
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).map_err(|_| CodingError::InvalidByte {
            byte: bytes[0],
            offset: 0,
            encoding: "UCS2BE",
        })
    }

    fn data_coding(&self) -> u8 {
        0x08
    }
}

impl Splitter for Ucs2Be {
    fn should_split(&self, text: &str, octet_limit: usize) -> bool {
        let limit = if octet_limit < 64 {
            DEFAULT_SPLIT_LIMIT
        } else {
            octet_limit
        };
        2 * text.chars().count() > limit
    }

    fn encode_split(&self, text: &str, octet_limit: usize) -> Result<Vec<Bytes>, CodingError> {
        let limit = if octet_limit < 64 {
            DEFAULT_SPLIT_LIMIT
        } else {
            octet_limit
        };
        let hextet_limit = limit / 2;
        let chars: Vec<char> = text.chars().collect();
        let mut segments = Vec::new();
        for chunk in chars.chunks(hextet_limit.max(1)) {
            let slice: String = chunk.iter().collect();
            segments.push(self.encode(&slice)?);
        }
        Ok(segments)
    }
}
