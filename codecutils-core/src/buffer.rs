//! Raw byte buffer helpers: 8-bit strings, typed-array extraction,
//! concatenation and string validity checks.

use log::warn;
use rand::Rng;

use crate::config::CodecConfig;
use crate::typed_array::{ElementType, TypedArray};
use crate::utf8;

/// A read or write that does not fit in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BoundsError {
    #[error("{len} byte(s) at offset {offset} overflow a buffer of {capacity} byte(s)")]
    Overflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },
    #[error("offset {offset} is outside a buffer of {capacity} byte(s)")]
    OffsetOutOfRange { offset: usize, capacity: usize },
    #[error("at least one element must be requested")]
    EmptyRequest,
}

fn check_span(offset: usize, len: usize, capacity: usize) -> Result<(), BoundsError> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => {
            let err = BoundsError::Overflow {
                offset,
                len,
                capacity,
            };
            warn!("{err}");
            Err(err)
        }
    }
}

/// Packs text one byte per UTF-16 unit, keeping the low byte of each.
pub fn string8_to_buffer(text: &str) -> Vec<u8> {
    text.encode_utf16().map(|unit| unit as u8).collect()
}

/// Reads each byte as the character U+0000 to U+00FF of the same value.
pub fn buffer_to_string8(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Writes `text` one byte per UTF-16 unit into `buffer` starting at `offset`.
///
/// Nothing is written when the text does not fit.
pub fn set_string8_in_buffer(
    text: &str,
    buffer: &mut [u8],
    offset: usize,
) -> Result<(), BoundsError> {
    let packed = string8_to_buffer(text);
    check_span(offset, packed.len(), buffer.len())?;
    buffer[offset..offset + packed.len()].copy_from_slice(&packed);
    Ok(())
}

/// Reads `len` bytes at `offset` as an 8-bit string.
pub fn get_string8_from_buffer(
    buffer: &[u8],
    len: usize,
    offset: usize,
) -> Result<String, BoundsError> {
    check_span(offset, len, buffer.len())?;
    Ok(buffer_to_string8(&buffer[offset..offset + len]))
}

/// Copies `count` elements of `element_type` out of `buffer` starting at
/// `offset`, in native byte order.
pub fn extract_typed_array(
    buffer: &[u8],
    offset: usize,
    element_type: ElementType,
    count: usize,
) -> Result<TypedArray, BoundsError> {
    if count == 0 {
        warn!("{}", BoundsError::EmptyRequest);
        return Err(BoundsError::EmptyRequest);
    }
    if offset >= buffer.len() {
        let err = BoundsError::OffsetOutOfRange {
            offset,
            capacity: buffer.len(),
        };
        warn!("{err}");
        return Err(err);
    }
    let len = element_type
        .bytes_per_element()
        .checked_mul(count)
        .unwrap_or(usize::MAX);
    check_span(offset, len, buffer.len())?;
    Ok(TypedArray::from_ne_bytes(
        element_type,
        &buffer[offset..offset + len],
    ))
}

/// Concatenates buffers in order.
pub fn merge_buffers<B: AsRef<[u8]>>(buffers: &[B]) -> Vec<u8> {
    let total = buffers.iter().map(|b| b.as_ref().len()).sum();
    let mut merged = Vec::with_capacity(total);
    for buffer in buffers {
        merged.extend_from_slice(buffer.as_ref());
    }
    merged
}

/// Checks that `text` holds no replacement character and no control
/// character other than tab, line feed and carriage return.
///
/// Unless `config.exhaustive` is set, only `config.sample_size` positions
/// drawn at random over the whole string are looked at, so a rare bad
/// character can slip through.
pub fn is_valid_string(text: &str, config: &CodecConfig) -> bool {
    let units: Vec<u16> = text.encode_utf16().collect();
    let rejected = |unit: u16| utf8::is_rejected(u32::from(unit));

    if config.exhaustive || units.len() <= config.sample_size {
        return !units.iter().any(|&unit| rejected(unit));
    }

    let mut rng = rand::thread_rng();
    (0..config.sample_size).all(|_| !rejected(units[rng.gen_range(0..units.len())]))
}
