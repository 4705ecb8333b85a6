//! Little-endian fixed-width primitives shared by the index formats.

use std::io::{self, Read, Write};

use crate::error::{IndexError, IndexResult};

fn read_array<R: Read, const N: usize>(r: &mut R, what: &'static str) -> IndexResult<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => IndexError::Truncated(what),
        _ => IndexError::Io(e),
    })?;
    Ok(buf)
}

pub(crate) fn read_u8<R: Read>(r: &mut R, what: &'static str) -> IndexResult<u8> {
    read_array::<R, 1>(r, what).map(|b| b[0])
}

pub(crate) fn read_u32<R: Read>(r: &mut R, what: &'static str) -> IndexResult<u32> {
    read_array(r, what).map(u32::from_le_bytes)
}

pub(crate) fn read_u64<R: Read>(r: &mut R, what: &'static str) -> IndexResult<u64> {
    read_array(r, what).map(u64::from_le_bytes)
}

/// Read a signed 32-bit count, rejecting negative values.
pub(crate) fn read_count<R: Read>(r: &mut R, what: &'static str) -> IndexResult<usize> {
    let value = read_array(r, what).map(i32::from_le_bytes)?;
    usize::try_from(value).map_err(|_| IndexError::NegativeLength {
        what,
        value: value.into(),
    })
}

/// Read a signed 64-bit byte length, rejecting negative values.
pub(crate) fn read_length<R: Read>(r: &mut R, what: &'static str) -> IndexResult<u64> {
    let value = read_array(r, what).map(i64::from_le_bytes)?;
    u64::try_from(value).map_err(|_| IndexError::NegativeLength { what, value })
}

pub(crate) fn write_count<W: Write>(w: &mut W, count: usize) -> IndexResult<u64> {
    let count = i32::try_from(count).map_err(|_| {
        IndexError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "count does not fit in i32",
        ))
    })?;
    w.write_all(&count.to_le_bytes())?;
    Ok(4)
}

pub(crate) fn write_u32<W: Write>(w: &mut W, value: u32) -> IndexResult<u64> {
    w.write_all(&value.to_le_bytes())?;
    Ok(4)
}

pub(crate) fn write_u64<W: Write>(w: &mut W, value: u64) -> IndexResult<u64> {
    w.write_all(&value.to_le_bytes())?;
    Ok(8)
}

pub(crate) fn write_length<W: Write>(w: &mut W, value: u64) -> IndexResult<u64> {
    let value = i64::try_from(value).map_err(|_| {
        IndexError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "byte length does not fit in i64",
        ))
    })?;
    w.write_all(&value.to_le_bytes())?;
    Ok(8)
}
