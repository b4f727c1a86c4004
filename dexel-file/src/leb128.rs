//! ULEB128, the variable-length integer both the class-data and
//! encoded-value streams are built on.

use crate::error::{Error, Result};

/// Decode an unsigned LEB128 value from `data` starting at `offset`.
/// Returns (value, bytes_consumed).
///
/// Values are capped at 32 bits; a fifth byte may only contribute its low
/// four bits and must terminate the encoding.
pub fn decode_uleb128(data: &[u8], offset: usize) -> Result<(u32, usize)> {
    let mut result: u32 = 0;
    let mut shift = 0u32;
    let mut pos = offset;

    loop {
        let byte = *data.get(pos).ok_or(Error::InvalidLeb128(offset))?;
        pos += 1;

        if shift == 28 && byte & 0xf0 != 0 {
            return Err(Error::InvalidLeb128(offset));
        }
        result |= ((byte & 0x7f) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, pos - offset));
        }
        shift += 7;
    }
}

/// Append the ULEB128 encoding of `value` to `out`.
pub fn encode_uleb128(mut value: u32, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
