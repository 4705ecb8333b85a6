use std::io::{Read, Write};

use tracing::debug;

use crate::codec::IndexCodec;
use crate::error::IndexResult;
use crate::multihash_sorted::MultihashIndexSorted;
use crate::sorted::SortedIndex;

/// A piece index tagged with its codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CarIndex {
    Sorted(SortedIndex),
    MultihashSorted(MultihashIndexSorted),
}

impl CarIndex {
    /// An empty index of the given variant.
    pub fn new(codec: IndexCodec) -> Self {
        match codec {
            IndexCodec::Sorted => Self::Sorted(SortedIndex::new()),
            IndexCodec::MultihashSorted => Self::MultihashSorted(MultihashIndexSorted::new()),
        }
    }

    pub fn codec(&self) -> IndexCodec {
        match self {
            Self::Sorted(_) => IndexCodec::Sorted,
            Self::MultihashSorted(_) => IndexCodec::MultihashSorted,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Sorted(index) => index.len(),
            Self::MultihashSorted(index) => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The iterable variant, if this is one.
    pub fn as_multihash_sorted(&self) -> Option<&MultihashIndexSorted> {
        match self {
            Self::MultihashSorted(index) => Some(index),
            Self::Sorted(_) => None,
        }
    }

    /// Write the canonical body without the codec header.
    pub fn marshal<W: Write>(&self, w: &mut W) -> IndexResult<u64> {
        match self {
            Self::Sorted(index) => index.marshal(w),
            Self::MultihashSorted(index) => index.marshal(w),
        }
    }

    /// Canonical body as bytes; equal entry sets give equal bytes.
    pub fn to_canonical_bytes(&self) -> IndexResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.marshal(&mut buf)?;
        Ok(buf)
    }

    /// Write the codec header followed by the canonical body.
    pub fn write_to<W: Write>(&self, w: &mut W) -> IndexResult<u64> {
        let header = self.codec().write_header(w)?;
        let body = self.marshal(w)?;
        debug!(codec = %self.codec(), entries = self.len(), bytes = header + body, "index written");
        Ok(header + body)
    }

    /// Read a codec-tagged index.
    pub fn read_from<R: Read>(r: &mut R) -> IndexResult<Self> {
        let codec = IndexCodec::read_header(r)?;
        let index = match codec {
            IndexCodec::Sorted => Self::Sorted(SortedIndex::unmarshal(r)?),
            IndexCodec::MultihashSorted => {
                Self::MultihashSorted(MultihashIndexSorted::unmarshal(r)?)
            }
        };
        debug!(codec = %codec, entries = index.len(), "index read");
        Ok(index)
    }
}

impl From<MultihashIndexSorted> for CarIndex {
    fn from(index: MultihashIndexSorted) -> Self {
        Self::MultihashSorted(index)
    }
}

impl From<SortedIndex> for CarIndex {
    fn from(index: SortedIndex) -> Self {
        Self::Sorted(index)
    }
}
