use std::path::PathBuf;

use dagkv_index::{IndexCodec, IndexError};
use dagkv_layout::LayoutError;
use dagkv_store::StoreError;
use dagkv_types::{PieceCid, TypeError};

/// Errors from the import pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The source index cannot be iterated as `(hash, offset)` pairs.
    #[error("unsupported index variant: {codec}")]
    UnsupportedIndexVariant { codec: IndexCodec },

    /// The index rebuilt from the store differs from the source.
    #[error(
        "round trip of piece {piece} does not match: source {source_len} bytes, rebuilt {rebuilt_len} bytes"
    )]
    VerificationMismatch {
        piece: PieceCid,
        source_len: usize,
        rebuilt_len: usize,
    },

    /// An index file name does not carry a piece CID.
    #[error("invalid index file name {path}: {reason}")]
    InvalidFileName { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for pipeline operations.
pub type BackendResult<T> = Result<T, BackendError>;
