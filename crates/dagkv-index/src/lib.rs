//! Sorted piece indices.
//!
//! A piece index maps the content hash of every block in a piece to the
//! block's byte offset. Two on-disk variants exist, told apart by a
//! uvarint codec header:
//!
//! - [`MultihashIndexSorted`] (`0x0401`): records grouped by multihash
//!   code, then by record width; iterable as `(ContentHash, offset)`.
//! - [`SortedIndex`] (`0x0400`): width-bucketed digests only; supports
//!   lookups but cannot recover full hashes.
//!
//! Serialization is canonical: an index's bytes depend only on its entry
//! set, which is what lets two indices be compared by their bytes.

mod bucket;
pub mod car;
pub mod codec;
pub mod error;
pub mod multihash_sorted;
pub mod sorted;
mod wire;

pub use car::CarIndex;
pub use codec::IndexCodec;
pub use error::{IndexError, IndexResult};
pub use multihash_sorted::MultihashIndexSorted;
pub use sorted::SortedIndex;
