//! LEB128 unsigned varints.

use crate::error::TypeError;

/// Maximum encoded length of a `u64` varint.
pub const MAX_VARINT_LEN64: usize = 10;

/// Encode `value` as LEB128, appending to `buf`. Returns the number of bytes written.
pub fn encode_uvarint(mut value: u64, buf: &mut Vec<u8>) -> usize {
    let start = buf.len();
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
    buf.len() - start
}

/// Decode a LEB128 `u64` from the front of `buf`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_uvarint(buf: &[u8]) -> Result<(u64, usize), TypeError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if i == MAX_VARINT_LEN64 {
            return Err(TypeError::VarintOverflow);
        }
        let payload = (byte & 0x7F) as u64;
        if shift == 63 && payload > 1 {
            return Err(TypeError::VarintOverflow);
        }
        result |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(TypeError::VarintTruncated)
}
