//! Round-trip verification by canonical bytes.

use dagkv_index::CarIndex;
use dagkv_types::PieceCid;
use tracing::debug;

use crate::error::{BackendError, BackendResult};

/// `true` iff both indices serialize to identical canonical bytes.
pub fn verify(source: &CarIndex, rebuilt: &CarIndex) -> BackendResult<bool> {
    Ok(compare(source, rebuilt)?.is_none())
}

/// Fail with [`BackendError::VerificationMismatch`] unless the indices
/// serialize identically.
pub fn ensure_identical(piece: &PieceCid, source: &CarIndex, rebuilt: &CarIndex) -> BackendResult<()> {
    match compare(source, rebuilt)? {
        None => Ok(()),
        Some((source_len, rebuilt_len)) => Err(BackendError::VerificationMismatch {
            piece: *piece,
            source_len,
            rebuilt_len,
        }),
    }
}

/// Byte lengths of both forms when they differ.
fn compare(source: &CarIndex, rebuilt: &CarIndex) -> BackendResult<Option<(usize, usize)>> {
    let a = source.to_canonical_bytes()?;
    let b = rebuilt.to_canonical_bytes()?;
    let identical = source.codec() == rebuilt.codec() && a == b;
    debug!(
        source = %blake3::hash(&a).to_hex(),
        rebuilt = %blake3::hash(&b).to_hex(),
        identical,
        "canonical forms compared"
    );
    Ok((!identical).then_some((a.len(), b.len())))
}
