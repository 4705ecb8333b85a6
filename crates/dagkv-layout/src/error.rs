use dagkv_store::StoreError;
use dagkv_types::{Cursor, PieceCid, TypeError};

/// Errors from the key layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The system counter has never been set.
    #[error("cursor counter not initialized")]
    NotInitialized,

    /// A reseed would move the counter backwards over allocated cursors.
    #[error("cannot lower cursor counter from {current} to {requested}")]
    CounterRegression { current: Cursor, requested: Cursor },

    /// No namespace is bound to the piece.
    #[error("piece not found: {0}")]
    NotFound(PieceCid),

    /// A stored key does not parse. The store is corrupt.
    #[error("cannot decode key {key}: {reason}")]
    KeyDecode { key: String, reason: String },

    /// A stored value is not an 8-byte integer. The store is corrupt.
    #[error("corrupt value under key {key}: expected 8 bytes, found {len}")]
    CorruptValue { key: String, len: usize },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LayoutError {
    pub(crate) fn key_decode(key: &[u8], reason: impl Into<String>) -> Self {
        Self::KeyDecode {
            key: hex::encode(key),
            reason: reason.into(),
        }
    }
}

/// Result alias for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;
