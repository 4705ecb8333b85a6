//! Key layout for dagkv.
//!
//! Many per-piece indices are flattened into one ordered key-value store.
//! Each piece's entries live in their own namespace, a numeric key prefix
//! called a cursor; a registry maps pieces to cursors and a single system
//! counter hands out fresh cursors.
//!
//! # Components
//!
//! - [`keys`] -- the key codec: fixed-width prefixes and the [`Key`] enum
//! - [`CursorAllocator`] -- the system counter
//! - [`PieceRegistry`] -- piece to cursor bindings
//! - [`NamespaceStore`] -- bulk writes and scans of one namespace
//!
//! # Design Rules
//!
//! 1. Cursors below 100 are never allocated; their prefixes are reserved
//!    for the system and registry keys.
//! 2. Every key prefix has the same width, so namespace prefix scans
//!    never match another namespace's keys.
//! 3. A key or value that fails to decode is reported as corruption, never
//!    skipped.

pub mod cursor;
pub mod error;
pub mod keys;
pub mod namespace;
pub mod registry;

pub use cursor::CursorAllocator;
pub use error::{LayoutError, LayoutResult};
pub use keys::{Key, PREFIX_WIDTH};
pub use namespace::{EntryScan, NamespaceStore, DEFAULT_BATCH_SIZE};
pub use registry::{Bindings, PieceRegistry};
