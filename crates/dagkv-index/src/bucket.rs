//! Width buckets: runs of fixed-width `digest ++ u64 offset` records.
//!
//! Both index variants group records by width (digest length + 8) and
//! write each group as `u32 width`, `i64 byte length`, then the records
//! sorted by digest. A bucket list is prefixed by an `i32` count.

use std::io::{Read, Write};

use crate::error::{IndexError, IndexResult};
use crate::wire;

/// Size of the offset trailing every record.
pub(crate) const OFFSET_SIZE: u32 = 8;

/// One bucket ready to be written. Every digest in `records` has length
/// `width - OFFSET_SIZE`.
pub(crate) struct Bucket<'a> {
    pub(crate) width: u32,
    pub(crate) records: Vec<(&'a [u8], u64)>,
}

/// Group records into buckets.
///
/// `records` must already be ordered by digest length, then digest bytes.
pub(crate) fn group_by_width<'a, I>(records: I) -> Vec<Bucket<'a>>
where
    I: IntoIterator<Item = (&'a [u8], u64)>,
{
    let mut buckets: Vec<Bucket<'a>> = Vec::new();
    for (digest, offset) in records {
        let width = digest.len() as u32 + OFFSET_SIZE;
        match buckets.last_mut() {
            Some(bucket) if bucket.width == width => bucket.records.push((digest, offset)),
            _ => buckets.push(Bucket {
                width,
                records: vec![(digest, offset)],
            }),
        }
    }
    buckets
}

/// Write a counted bucket list. Returns the number of bytes written.
pub(crate) fn write_buckets<W: Write>(w: &mut W, buckets: &[Bucket<'_>]) -> IndexResult<u64> {
    let mut written = wire::write_count(w, buckets.len())?;
    for bucket in buckets {
        written += wire::write_u32(w, bucket.width)?;
        let byte_len = bucket.records.len() as u64 * u64::from(bucket.width);
        written += wire::write_length(w, byte_len)?;
        for (digest, offset) in &bucket.records {
            w.write_all(digest)?;
            written += digest.len() as u64;
            written += wire::write_u64(w, *offset)?;
        }
    }
    Ok(written)
}

/// Read a counted bucket list, handing every record to `visit`.
pub(crate) fn read_buckets<R, F>(r: &mut R, mut visit: F) -> IndexResult<()>
where
    R: Read,
    F: FnMut(&[u8], u64) -> IndexResult<()>,
{
    let count = wire::read_count(r, "bucket count")?;
    for _ in 0..count {
        let width = wire::read_u32(r, "record width")?;
        if width < OFFSET_SIZE {
            return Err(IndexError::InvalidWidth {
                width,
                reason: "record is narrower than its offset",
            });
        }
        let byte_len = wire::read_length(r, "bucket length")?;
        if byte_len % u64::from(width) != 0 {
            return Err(IndexError::InvalidWidth {
                width,
                reason: "bucket length is not a multiple of the width",
            });
        }

        let mut records = Vec::new();
        r.by_ref().take(byte_len).read_to_end(&mut records)?;
        if records.len() as u64 != byte_len {
            return Err(IndexError::Truncated("bucket records"));
        }

        let digest_len = (width - OFFSET_SIZE) as usize;
        for record in records.chunks_exact(width as usize) {
            let (digest, raw_offset) = record.split_at(digest_len);
            let mut offset = [0u8; 8];
            offset.copy_from_slice(raw_offset);
            visit(digest, u64::from_le_bytes(offset))?;
        }
    }
    Ok(())
}
