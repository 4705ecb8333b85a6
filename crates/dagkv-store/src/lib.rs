//! Ordered key-value storage for dagkv.
//!
//! dagkv's key layout sits on top of any store that offers point reads and
//! writes, ordered prefix scans and a conditional write. This crate defines
//! that contract and ships two backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`KvStore`] trait:
//!
//! - [`InMemoryKvStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FileKvStore`] -- the same ordered table made durable by an
//!   append-only, CRC-framed log that is replayed on open
//!
//! # Design Rules
//!
//! 1. Keys are compared as raw bytes; scans yield keys in ascending order.
//! 2. Prefix scans are lazy and never hold a lock across yields.
//! 3. Every mutation of a [`FileKvStore`] goes through its log writer, so
//!    conditional writes are atomic with respect to all other writes.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{FileKvStore, LogConfig, SyncMode, LOG_FILE_NAME};
pub use memory::InMemoryKvStore;
pub use traits::{KvPair, KvStore, ScanIter};
