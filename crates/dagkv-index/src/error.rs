use dagkv_types::TypeError;

/// Errors from reading, writing or building piece indices.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The codec header names an index format this crate does not know.
    #[error("unknown index codec: 0x{0:04x}")]
    UnknownCodec(u64),

    /// The codec header is not a valid uvarint.
    #[error("malformed codec header: {0}")]
    MalformedHeader(TypeError),

    /// The input ended inside a structure.
    #[error("index truncated while reading {0}")]
    Truncated(&'static str),

    /// A count or byte length field is negative.
    #[error("negative {what}: {value}")]
    NegativeLength { what: &'static str, value: i64 },

    /// A width bucket is inconsistent with its declared record width.
    #[error("invalid record width {width}: {reason}")]
    InvalidWidth { width: u32, reason: &'static str },

    /// A record could not be turned back into a content hash.
    #[error("invalid hash in index: {0}")]
    InvalidHash(TypeError),

    /// I/O error from the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
