use std::fmt;
use std::io::{Read, Write};

use dagkv_types::varint::{decode_uvarint, encode_uvarint, MAX_VARINT_LEN64};

use crate::error::{IndexError, IndexResult};
use crate::wire;

/// Multicodec tag written in front of a serialized index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexCodec {
    /// Width-bucketed digests without multihash codes.
    Sorted,
    /// Digests grouped by multihash code, then by width.
    MultihashSorted,
}

impl IndexCodec {
    pub const SORTED_CODE: u64 = 0x0400;
    pub const MULTIHASH_SORTED_CODE: u64 = 0x0401;

    pub fn code(self) -> u64 {
        match self {
            Self::Sorted => Self::SORTED_CODE,
            Self::MultihashSorted => Self::MULTIHASH_SORTED_CODE,
        }
    }

    pub fn from_code(code: u64) -> IndexResult<Self> {
        match code {
            Self::SORTED_CODE => Ok(Self::Sorted),
            Self::MULTIHASH_SORTED_CODE => Ok(Self::MultihashSorted),
            other => Err(IndexError::UnknownCodec(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sorted => "car-index-sorted",
            Self::MultihashSorted => "car-multihash-index-sorted",
        }
    }

    /// Read the uvarint header from `r`.
    pub fn read_header<R: Read>(r: &mut R) -> IndexResult<Self> {
        let mut buf = Vec::with_capacity(MAX_VARINT_LEN64);
        loop {
            let byte = wire::read_u8(r, "codec header")?;
            buf.push(byte);
            if byte & 0x80 == 0 || buf.len() == MAX_VARINT_LEN64 {
                break;
            }
        }
        let (code, _) = decode_uvarint(&buf).map_err(IndexError::MalformedHeader)?;
        Self::from_code(code)
    }

    /// Write the uvarint header. Returns the number of bytes written.
    pub fn write_header<W: Write>(self, w: &mut W) -> IndexResult<u64> {
        let mut buf = Vec::with_capacity(MAX_VARINT_LEN64);
        let n = encode_uvarint(self.code(), &mut buf);
        w.write_all(&buf)?;
        Ok(n as u64)
    }
}

impl fmt::Display for IndexCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_bytes_are_uvarint() {
        let mut buf = Vec::new();
        assert_eq!(IndexCodec::MultihashSorted.write_header(&mut buf).unwrap(), 2);
        assert_eq!(buf, vec![0x81, 0x08]);

        let mut r = buf.as_slice();
        assert_eq!(
            IndexCodec::read_header(&mut r).unwrap(),
            IndexCodec::MultihashSorted
        );
    }

    #[test]
    fn unknown_code_is_rejected() {
        let mut buf = Vec::new();
        encode_uvarint(0x0402, &mut buf);
        let mut r = buf.as_slice();
        assert!(matches!(
            IndexCodec::read_header(&mut r),
            Err(IndexError::UnknownCodec(0x0402))
        ));
    }

    #[test]
    fn empty_header_is_truncated() {
        let mut r: &[u8] = &[];
        assert!(matches!(
            IndexCodec::read_header(&mut r),
            Err(IndexError::Truncated(_))
        ));
    }

    #[test]
    fn overlong_header_is_malformed() {
        let mut r: &[u8] = &[0xff; 12];
        assert!(matches!(
            IndexCodec::read_header(&mut r),
            Err(IndexError::MalformedHeader(_))
        ));
    }
}
