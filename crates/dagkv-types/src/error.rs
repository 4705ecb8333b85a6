use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid multihash: {0}")]
    InvalidMultihash(String),

    #[error("invalid CID: {0}")]
    InvalidCid(String),

    #[error("cursor {0} falls in the reserved range")]
    ReservedCursor(u64),

    #[error("cursor space exhausted")]
    CursorOverflow,

    #[error("varint truncated")]
    VarintTruncated,

    #[error("varint overflows 64 bits")]
    VarintOverflow,
}
