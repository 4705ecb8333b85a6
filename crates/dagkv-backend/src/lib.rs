//! Import pipeline for dagkv.
//!
//! [`Backend`] ties the key layout to piece indices: it exports a source
//! index's entries into a freshly allocated namespace, binds the piece to
//! that namespace, and can rebuild the index from the store on demand.
//!
//! # Modules
//!
//! - [`adapter`] -- index to entry stream and back
//! - [`verify`] -- round-trip check by canonical bytes
//! - [`config`] -- [`BackendConfig`], loadable from TOML
//!
//! # Design Rules
//!
//! 1. Write, flush, then link: a piece is bound to its namespace only
//!    after every entry has been written and synced.
//! 2. A verification mismatch or a corrupt key halts the pipeline.
//! 3. Rebuilt indices depend only on the stored entry set, never on scan
//!    order.

pub mod adapter;
pub mod backend;
pub mod config;
pub mod error;
pub mod verify;

pub use backend::{Backend, ImportReport, ImportSummary};
pub use config::{BackendConfig, DEFAULT_INDEX_SUFFIX};
pub use error::{BackendError, BackendResult};
