use std::collections::BTreeMap;
use std::io::{Read, Write};

use dagkv_types::ContentHash;

use crate::bucket;
use crate::error::{IndexError, IndexResult};
use crate::wire;

/// Sorted index from content hash to byte offset, grouped by multihash code.
///
/// Entries are kept in [`ContentHash`] order (code, digest length, digest),
/// which is exactly the order of the canonical serialization, so two
/// indices holding the same entry set marshal to identical bytes no matter
/// the order the entries were loaded in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultihashIndexSorted {
    entries: BTreeMap<ContentHash, u64>,
}

impl MultihashIndexSorted {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one entry. A hash already present has its offset replaced.
    pub fn insert(&mut self, hash: ContentHash, offset: u64) {
        self.entries.insert(hash, offset);
    }

    /// Load a batch of entries; later duplicates win.
    pub fn load<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (ContentHash, u64)>,
    {
        self.entries.extend(entries);
    }

    pub fn get(&self, hash: &ContentHash) -> Option<u64> {
        self.entries.get(hash).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every `(hash, offset)` pair, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ContentHash, u64)> + '_ {
        self.entries.iter().map(|(h, o)| (*h, *o))
    }

    /// Distinct multihash codes present, ascending.
    pub fn codes(&self) -> Vec<u64> {
        let mut codes: Vec<u64> = self.entries.keys().map(ContentHash::code).collect();
        codes.dedup();
        codes
    }

    /// Write the canonical form (no codec header).
    pub fn marshal<W: Write>(&self, w: &mut W) -> IndexResult<u64> {
        let mut by_code: Vec<(u64, Vec<(&[u8], u64)>)> = Vec::new();
        for (hash, offset) in &self.entries {
            let record = (hash.digest(), *offset);
            match by_code.last_mut() {
                Some((code, records)) if *code == hash.code() => records.push(record),
                _ => by_code.push((hash.code(), vec![record])),
            }
        }

        let mut written = wire::write_count(w, by_code.len())?;
        for (code, records) in by_code {
            written += wire::write_u64(w, code)?;
            written += bucket::write_buckets(w, &bucket::group_by_width(records))?;
        }
        Ok(written)
    }

    /// Read the canonical form (no codec header).
    pub fn unmarshal<R: Read>(r: &mut R) -> IndexResult<Self> {
        let mut index = Self::new();
        let codes = wire::read_count(r, "code count")?;
        for _ in 0..codes {
            let code = wire::read_u64(r, "multihash code")?;
            bucket::read_buckets(r, |digest, offset| {
                let hash = ContentHash::wrap(code, digest).map_err(IndexError::InvalidHash)?;
                index.insert(hash, offset);
                Ok(())
            })?;
        }
        Ok(index)
    }
}

impl FromIterator<(ContentHash, u64)> for MultihashIndexSorted {
    fn from_iter<I: IntoIterator<Item = (ContentHash, u64)>>(iter: I) -> Self {
        let mut index = Self::new();
        index.load(iter);
        index
    }
}
