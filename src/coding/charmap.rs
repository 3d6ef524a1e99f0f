// ABOUTME: Single-byte character set codings: LATIN1 (ISO-8859-1), CYRILLIC (ISO-8859-5), HEBREW (ISO-8859-8)

use crate::coding::{Coding, CodingError};
use bytes::Bytes;

/// ISO-8859-1. The low 256 Unicode code points map directly onto byte values, so
/// this coding is the identity function restricted to `U+0000..=U+00FF`.
pub struct Latin1;

impl Coding for Latin1 {
    fn encode(&self, text: &str) -> Result<Bytes, CodingError> {
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            let code = c as u32;
            if code > 0xFF {
                return Err(CodingError::InvalidCharacter {
                    character: c,
                    encoding: "LATIN1",
                });
            }
            out.push(code as u8);
        }
        Ok(Bytes::from(out))
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodingError> {
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    fn data_coding(&self) -> u8 {
        0x03
    }
}

fn cyrillic_to_char(byte: u8) -> Option<char> {
    Some(match byte {
        0x00..=0xA0 => byte as char,
        0xA1 => '\u{0401}',
        0xA2 => '\u{0402}',
        0xA3 => '\u{0403}',
        0xA4 => '\u{0404}',
        0xA5 => '\u{0405}',
        0xA6 => '\u{0406}',
        0xA7 => '\u{0407}',
        0xA8 => '\u{0408}',
        0xA9 => '\u{0409}',
        0xAA => '\u{040A}',
        0xAB => '\u{040B}',
        0xAC => '\u{040C}',
        0xAD => '\u{00AD}',
        0xAE => '\u{040E}',
        0xAF => '\u{040F}',
        0xB0..=0xCF => char::from_u32(0x0410 + (byte - 0xB0) as u32)?,
        0xD0..=0xFF => char::from_u32(0x0430 + (byte - 0xD0) as u32)?,
    })
}

fn char_to_cyrillic(c: char) -> Option<u8> {
    let code = c as u32;
    if code <= 0xA0 {
        return Some(code as u8);
    }
    Some(match code {
        0x0401 => 0xA1,
        0x0402 => 0xA2,
        0x0403 => 0xA3,
        0x0404 => 0xA4,
        0x0405 => 0xA5,
        0x0406 => 0xA6,
        0x0407 => 0xA7,
        0x0408 => 0xA8,
        0x0409 => 0xA9,
        0x040A => 0xAA,
        0x040B => 0xAB,
        0x040C => 0xAC,
        0x00AD => 0xAD,
        0x040E => 0xAE,
        0x040F => 0xAF,
        0x0410..=0x042F => 0xB0 + (code - 0x0410) as u8,
        0x0430..=0x044F => 0xD0 + (code - 0x0430) as u8,
        _ => return None,
    })
}

/// ISO-8859-5 (Cyrillic).
pub struct Cyrillic;

impl Coding for Cyrillic {
    fn encode(&self, text: &str) -> Result<Bytes, CodingError> {
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            let byte = char_to_cyrillic(c).ok_or(CodingError::InvalidCharacter {
                character: c,
                encoding: "CYRILLIC",
            })?;
            out.push(byte);
        }
        Ok(Bytes::from(out))
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodingError> {
        bytes
            .iter()
            .enumerate()
            .map(|(offset, &b)| {
                cyrillic_to_char(b).ok_or(CodingError::InvalidByte {
                    byte: b,
                    offset,
                    encoding: "CYRILLIC",
                })
            })
            .collect()
    }

    fn data_coding(&self) -> u8 {
        0x06
    }
}

fn hebrew_to_char(byte: u8) -> Option<char> {
    Some(match byte {
        0x00..=0x9F => byte as char,
        0xA0 => '\u{00A0}',
        0xA2..=0xA9 => char::from_u32(0x00A2 + (byte - 0xA2) as u32)?,
        0xAA => '\u{00D7}', // multiplication sign, not ª
        0xAB..=0xAC => char::from_u32(0x00AB + (byte - 0xAB) as u32)?,
        0xAD => '\u{00AD}',
        0xAE..=0xB9 => char::from_u32(0x00AE + (byte - 0xAE) as u32)?,
        0xBA => '\u{00F7}', // division sign, not º
        0xBB..=0xBE => char::from_u32(0x00AE + (byte - 0xAE) as u32)?,
        0xDF => '\u{2017}',
        0xE0..=0xFA => char::from_u32(0x05D0 + (byte - 0xE0) as u32)?,
        0xFD => '\u{200E}',
        0xFE => '\u{200F}',
        _ => return None,
    })
}

fn char_to_hebrew(c: char) -> Option<u8> {
    let code = c as u32;
    if code <= 0x9F {
        return Some(code as u8);
    }
    Some(match code {
        0x00A0 => 0xA0,
        0x00A2..=0x00A9 => 0xA2 + (code - 0x00A2) as u8,
        0x00D7 => 0xAA,
        0x00AB..=0x00AC => 0xAB + (code - 0x00AB) as u8,
        0x00AD => 0xAD,
        0x00AE..=0x00B9 => 0xAE + (code - 0x00AE) as u8,
        0x00F7 => 0xBA,
        0x00BB..=0x00BE => 0xAE + (code - 0x00AE) as u8,
        0x2017 => 0xDF,
        0x05D0..=0x05EA => 0xE0 + (code - 0x05D0) as u8,
        0x200E => 0xFD,
        0x200F => 0xFE,
        _ => return None,
    })
}

/// ISO-8859-8 (Hebrew).
pub struct Hebrew;

impl Coding for Hebrew {
    fn encode(&self, text: &str) -> Result<Bytes, CodingError> {
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            let byte = char_to_hebrew(c).ok_or(CodingError::InvalidCharacter {
                character: c,
                encoding: "HEBREW",
            })?;
            out.push(byte);
        }
        Ok(Bytes::from(out))
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodingError> {
        bytes
            .iter()
            .enumerate()
            .map(|(offset, &b)| {
                hebrew_to_char(b).ok_or(CodingError::InvalidByte {
                    byte: b,
                    offset,
                    encoding: "HEBREW",
                })
            })
            .collect()
    }

    fn data_coding(&self) -> u8 {
        0x07
    }
}

/// ASCII/IA5 (identity map restricted to 7-bit bytes).
pub struct Ascii;

impl Coding for Ascii {
    fn encode(&self, text: &str) -> Result<Bytes, CodingError> {
        for c in text.chars() {
            if c as u32 > 0x7F {
                return Err(CodingError::InvalidCharacter {
                    character: c,
                    encoding: "ASCII",
                });
            }
        }
        Ok(Bytes::from(text.as_bytes().to_vec()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, CodingError> {
        bytes
            .iter()
            .enumerate()
            .map(|(offset, &b)| {
                if b > 0x7F {
                    Err(CodingError::InvalidByte {
                        byte: b,
                        offset,
                        encoding: "ASCII",
                    })
                } else {
                    Ok(b as char)
                }
            })
            .collect()
    }

    fn data_coding(&self) -> u8 {
        0x01
    }
}

/// Opaque binary codings. They exist so the tag byte resolves to a known handler;
/// callers that need raw bytes should bypass the registry entirely.
pub struct Binary8Bit1;

impl Coding for Binary8Bit1 {
    fn encode(&self, _text: &str) -> Result<Bytes, CodingError> {
        Err(CodingError::NotImplementedEncode { encoding: "BIN8-1" })
    }

    fn decode(&self, _bytes: &[u8]) -> Result<String, CodingError> {
        Err(CodingError::NotImplementedDecode { encoding: "BIN8-1" })
    }

    fn data_coding(&self) -> u8 {
        0x02
    }
}

pub struct Binary8Bit2;

impl Coding for Binary8Bit2 {
    fn encode(&self, _text: &str) -> Result<Bytes, CodingError> {
        Err(CodingError::NotImplementedEncode { encoding: "BIN8-2" })
    }

    fn decode(&self, _bytes: &[u8]) -> Result<String, CodingError> {
        Err(CodingError::NotImplementedDecode { encoding: "BIN8-2" })
    }

    fn data_coding(&self) -> u8 {
        0x04
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_roundtrip() {
        let coding = Latin1;
        let bytes = coding.encode("café").unwrap();
        assert_eq!(coding.decode(&bytes).unwrap(), "café");
    }

    #[test]
    fn cyrillic_roundtrip() {
        let coding = Cyrillic;
        let bytes = coding.encode("Привет").unwrap();
        assert_eq!(coding.decode(&bytes).unwrap(), "Привет");
    }

    #[test]
    fn hebrew_roundtrip() {
        let coding = Hebrew;
        let bytes = coding.encode("שלום").unwrap();
        assert_eq!(coding.decode(&bytes).unwrap(), "שלום");
    }

    #[test]
    fn ascii_rejects_high_bit() {
        let coding = Ascii;
        assert!(coding.encode("café").is_err());
    }

    #[test]
    fn binary_codings_reject_encode_and_decode() {
        assert!(Binary8Bit1.encode("x").is_err());
        assert!(Binary8Bit1.decode(&[1, 2, 3]).is_err());
        assert!(Binary8Bit2.encode("x").is_err());
        assert!(Binary8Bit2.decode(&[1, 2, 3]).is_err());
    }
}
