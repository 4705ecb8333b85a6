use std::collections::BTreeMap;
use std::io::{Read, Write};

use dagkv_types::ContentHash;

use crate::bucket::{self, OFFSET_SIZE};
use crate::error::IndexResult;

/// Digest-only sorted index.
///
/// Records carry no multihash code, so the index can answer lookups by
/// digest but cannot be turned back into `(ContentHash, offset)` pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortedIndex {
    /// width -> digest -> offset
    buckets: BTreeMap<u32, BTreeMap<Vec<u8>, u64>>,
}

impl SortedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one digest. A digest already present has its offset replaced.
    pub fn insert(&mut self, digest: &[u8], offset: u64) {
        let width = digest.len() as u32 + OFFSET_SIZE;
        self.buckets
            .entry(width)
            .or_default()
            .insert(digest.to_vec(), offset);
    }

    /// Load entries keyed by the digest of each hash.
    pub fn load<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (ContentHash, u64)>,
    {
        for (hash, offset) in entries {
            self.insert(hash.digest(), offset);
        }
    }

    pub fn get(&self, digest: &[u8]) -> Option<u64> {
        let width = digest.len() as u32 + OFFSET_SIZE;
        self.buckets.get(&width)?.get(digest).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the canonical form (no codec header).
    pub fn marshal<W: Write>(&self, w: &mut W) -> IndexResult<u64> {
        let records = self
            .buckets
            .values()
            .flat_map(|b| b.iter().map(|(d, o)| (d.as_slice(), *o)));
        bucket::write_buckets(w, &bucket::group_by_width(records))
    }

    /// Read the canonical form (no codec header).
    pub fn unmarshal<R: Read>(r: &mut R) -> IndexResult<Self> {
        let mut index = Self::new();
        bucket::read_buckets(r, |digest, offset| {
            index.insert(digest, offset);
            Ok(())
        })?;
        Ok(index)
    }
}
