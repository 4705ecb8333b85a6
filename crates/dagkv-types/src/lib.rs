//! Foundation types for dagkv.
//!
//! dagkv flattens many per-piece "multihash → offset" indices into one
//! ordered key-value store. This crate holds the identifiers every other
//! crate speaks in.
//!
//! # Key Types
//!
//! - [`PieceCid`] — Content identifier of a piece (CIDv1)
//! - [`ContentHash`] — Multihash identifying one entry inside a piece's index
//! - [`Cursor`] — Namespace id under which one piece's entries are stored
//! - [`varint`] — LEB128 unsigned varints used for key prefixes and codecs

pub mod cursor;
pub mod error;
pub mod hash;
pub mod piece;
pub mod varint;

pub use cursor::{Cursor, RESERVED_CURSORS};
pub use error::TypeError;
pub use hash::ContentHash;
pub use piece::PieceCid;
