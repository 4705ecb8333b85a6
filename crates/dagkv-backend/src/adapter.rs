//! Conversion between piece indices and namespace entry streams.

use dagkv_index::{CarIndex, MultihashIndexSorted};
use dagkv_layout::LayoutResult;
use dagkv_types::ContentHash;

use crate::error::{BackendError, BackendResult};

/// Every `(hash, offset)` of `index`, once each.
///
/// Only the multihash-sorted variant carries full hashes; the digest-only
/// variant is rejected.
pub fn export(index: &CarIndex) -> BackendResult<impl Iterator<Item = (ContentHash, u64)> + '_> {
    index
        .as_multihash_sorted()
        .map(MultihashIndexSorted::iter)
        .ok_or(BackendError::UnsupportedIndexVariant {
            codec: index.codec(),
        })
}

/// Build a multihash-sorted index from entries in any order.
pub fn import<I>(entries: I) -> CarIndex
where
    I: IntoIterator<Item = (ContentHash, u64)>,
{
    entries.into_iter().collect::<MultihashIndexSorted>().into()
}

/// Like [`import`], for a fallible stream such as a namespace scan. The
/// first error aborts the import.
pub fn try_import<I>(entries: I) -> BackendResult<CarIndex>
where
    I: IntoIterator<Item = LayoutResult<(ContentHash, u64)>>,
{
    let index = entries
        .into_iter()
        .collect::<LayoutResult<MultihashIndexSorted>>()?;
    Ok(index.into())
}
