//! UTF-8 encoding of UTF-16 text, and strict decoding back.
//!
//! Encoding works on UTF-16 code units: a surrogate pair becomes one 4-byte
//! sequence, and a surrogate without its partner is encoded as a 3-byte
//! sequence of its own value. For a `&str` this is plain UTF-8.
//!
//! Decoding rejects anything that is not clean printable text: control bytes
//! other than tab, line feed and carriage return, DEL, the replacement
//! character U+FFFD, and every malformed byte sequence. The first problem
//! aborts the whole decode.

/// Why a byte buffer could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Utf8Error {
    #[error("non-printable byte 0x{byte:02x} at offset {offset}")]
    ControlByte { byte: u8, offset: usize },
    #[error("replacement character at offset {offset}")]
    ReplacementCharacter { offset: usize },
    #[error("invalid leading byte 0x{byte:02x} at offset {offset}")]
    InvalidLeadingByte { byte: u8, offset: usize },
    #[error("invalid continuation byte at offset {offset}")]
    InvalidContinuation { offset: usize },
    #[error("truncated sequence at offset {offset}")]
    Truncated { offset: usize },
    #[error("overlong sequence at offset {offset}")]
    Overlong { offset: usize },
    #[error("code point above U+10FFFF at offset {offset}")]
    OutOfRange { offset: usize },
    #[error("unpaired surrogate in decoded text")]
    LoneSurrogate,
}

const REPLACEMENT_CHARACTER: u32 = 0xFFFD;

/// Returns true for code points that never appear in valid text: C0 controls
/// other than tab, LF and CR, and DEL.
pub(crate) fn is_unprintable(code: u32) -> bool {
    (code < 0x20 && !matches!(code, 0x09 | 0x0A | 0x0D)) || code == 0x7F
}

/// Returns true for U+FFFD and for [`is_unprintable`] code points.
pub(crate) fn is_rejected(code: u32) -> bool {
    code == REPLACEMENT_CHARACTER || is_unprintable(code)
}

fn is_high_surrogate(unit: u16) -> bool {
    unit & 0xFC00 == 0xD800
}

fn is_low_surrogate(unit: u16) -> bool {
    unit & 0xFC00 == 0xDC00
}

/// Encodes text as UTF-8.
pub fn encode(text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    encode_utf16(&units)
}

/// Encodes UTF-16 code units as UTF-8, tolerating unpaired surrogates.
pub fn encode_utf16(units: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(units.len() * 3);
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        let c = u32::from(unit);
        if c < 0x80 {
            out.push(c as u8);
        } else if c < 0x800 {
            out.push((c >> 6) as u8 | 0xC0);
            out.push((c & 0x3F) as u8 | 0x80);
        } else if let Some(&low) = units
            .get(i + 1)
            .filter(|&&next| is_high_surrogate(unit) && is_low_surrogate(next))
        {
            let code = 0x10000 + ((c & 0x3FF) << 10) + (u32::from(low) & 0x3FF);
            out.push((code >> 18) as u8 | 0xF0);
            out.push(((code >> 12) & 0x3F) as u8 | 0x80);
            out.push(((code >> 6) & 0x3F) as u8 | 0x80);
            out.push((code & 0x3F) as u8 | 0x80);
            i += 1;
        } else {
            out.push((c >> 12) as u8 | 0xE0);
            out.push(((c >> 6) & 0x3F) as u8 | 0x80);
            out.push((c & 0x3F) as u8 | 0x80);
        }
        i += 1;
    }
    out
}

/// Decodes UTF-8 into text.
///
/// Fails on everything [`decode_utf16`] rejects, and on 3-byte sequences
/// holding a lone surrogate, which a `String` cannot represent.
pub fn decode(bytes: &[u8]) -> Result<String, Utf8Error> {
    let units = decode_utf16(bytes)?;
    String::from_utf16(&units).map_err(|_| Utf8Error::LoneSurrogate)
}

/// Decodes UTF-8 into UTF-16 code units.
///
/// Code points above the Basic Multilingual Plane come back as surrogate
/// pairs. Surrogate values encoded on their own are passed through, so this
/// is the exact inverse of [`encode_utf16`] for printable input.
pub fn decode_utf16(bytes: &[u8]) -> Result<Vec<u16>, Utf8Error> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let offset = pos;
        let lead = bytes[pos];
        let (len, bits, min) = match lead {
            0x00..=0x7F => {
                if is_unprintable(u32::from(lead)) {
                    return Err(Utf8Error::ControlByte { byte: lead, offset });
                }
                out.push(u16::from(lead));
                pos += 1;
                continue;
            }
            0xC0..=0xDF => (2, lead & 0x1F, 0x80),
            0xE0..=0xEF => (3, lead & 0x0F, 0x800),
            0xF0..=0xF4 => (4, lead & 0x07, 0x10000),
            _ => return Err(Utf8Error::InvalidLeadingByte { byte: lead, offset }),
        };

        let tail = bytes
            .get(pos + 1..pos + len)
            .ok_or(Utf8Error::Truncated { offset })?;
        let mut code = u32::from(bits);
        for (i, &byte) in tail.iter().enumerate() {
            if byte & 0xC0 != 0x80 {
                return Err(Utf8Error::InvalidContinuation {
                    offset: offset + 1 + i,
                });
            }
            code = (code << 6) | u32::from(byte & 0x3F);
        }

        if code < min {
            return Err(Utf8Error::Overlong { offset });
        }
        if code > 0x10FFFF {
            return Err(Utf8Error::OutOfRange { offset });
        }
        if code == REPLACEMENT_CHARACTER {
            return Err(Utf8Error::ReplacementCharacter { offset });
        }

        if code >= 0x10000 {
            let u = code - 0x10000;
            out.push(0xD800 + (u >> 10) as u16);
            out.push(0xDC00 + (u & 0x3FF) as u16);
        } else {
            out.push(code as u16);
        }
        pos += len;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roundtrip_with_surrogate_pair() {
        let text = "I can has 🍔";
        let bytes = encode(text);
        assert_eq!(bytes, text.as_bytes());
        assert_eq!(decode(&bytes).unwrap(), text);
    }

    #[test]
    fn encodes_each_width() {
        assert_eq!(encode("A"), vec![0x41]);
        assert_eq!(encode("é"), vec![0xC3, 0xA9]);
        assert_eq!(encode("€"), vec![0xE2, 0x82, 0xAC]);
        assert_eq!(encode("🍔"), vec![0xF0, 0x9F, 0x8D, 0x94]);
    }

    #[test]
    fn lone_high_surrogate_is_three_bytes() {
        let bytes = encode_utf16(&[0xD83C, 0x41]);
        assert_eq!(bytes, vec![0xED, 0xA0, 0xBC, 0x41]);
        assert_eq!(decode_utf16(&bytes).unwrap(), vec![0xD83C, 0x41]);
        assert_eq!(decode(&bytes), Err(Utf8Error::LoneSurrogate));
    }

    #[test]
    fn allows_whitespace_controls() {
        assert_eq!(decode(b"a\tb\nc\rd").unwrap(), "a\tb\nc\rd");
    }

    #[test]
    fn rejects_del() {
        assert_eq!(
            decode(&[0x61, 0x7F]),
            Err(Utf8Error::ControlByte { byte: 0x7F, offset: 1 })
        );
    }

    #[test]
    fn rejects_control_bytes() {
        assert_eq!(
            decode(&[0x00]),
            Err(Utf8Error::ControlByte { byte: 0x00, offset: 0 })
        );
        assert!(decode(&[0x1B]).is_err());
    }

    #[test]
    fn rejects_replacement_character() {
        assert_eq!(
            decode(&[0x41, 0xEF, 0xBF, 0xBD]),
            Err(Utf8Error::ReplacementCharacter { offset: 1 })
        );
    }

    #[test]
    fn rejects_malformed_sequences() {
        assert_eq!(
            decode(&[0x80]),
            Err(Utf8Error::InvalidLeadingByte { byte: 0x80, offset: 0 })
        );
        assert_eq!(
            decode(&[0xF5, 0x80, 0x80, 0x80]),
            Err(Utf8Error::InvalidLeadingByte { byte: 0xF5, offset: 0 })
        );
        assert_eq!(decode(&[0xE2, 0x82]), Err(Utf8Error::Truncated { offset: 0 }));
        assert_eq!(
            decode(&[0xC3, 0x41]),
            Err(Utf8Error::InvalidContinuation { offset: 1 })
        );
        assert_eq!(decode(&[0xC0, 0x80]), Err(Utf8Error::Overlong { offset: 0 }));
        assert_eq!(
            decode(&[0xF4, 0x90, 0x80, 0x80]),
            Err(Utf8Error::OutOfRange { offset: 0 })
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(encode(""), Vec::<u8>::new());
        assert_eq!(decode(&[]).unwrap(), "");
    }

    proptest! {
        #[test]
        fn printable_text_roundtrips(text in "\\PC*") {
            prop_assume!(!text.contains('\u{FFFD}'));
            let bytes = encode(&text);
            prop_assert_eq!(&bytes[..], text.as_bytes());
            prop_assert_eq!(decode(&bytes).unwrap(), text);
        }
    }
}
