use std::sync::Arc;

use dagkv_store::{KvPair, KvStore, ScanIter};
use dagkv_types::{ContentHash, Cursor};
use tracing::debug;

use crate::error::{LayoutError, LayoutResult};
use crate::keys::{decode_value, encode_value, namespace_prefix, Key};

/// Default number of entries per store batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Bulk writes and prefix scans of one namespace's `(hash, offset)` entries.
///
/// Writes are not atomic across batches; a failed `put_all` leaves a
/// partially written namespace that the next import abandons by allocating
/// a fresh cursor.
#[derive(Clone)]
pub struct NamespaceStore {
    store: Arc<dyn KvStore>,
    batch_size: usize,
}

impl NamespaceStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Entries per `write_batch` call; clamped to at least one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Write every entry under `cursor`. Returns the number written.
    pub fn put_all<I>(&self, cursor: Cursor, entries: I) -> LayoutResult<u64>
    where
        I: IntoIterator<Item = (ContentHash, u64)>,
    {
        let mut batch: Vec<KvPair> = Vec::with_capacity(self.batch_size);
        let mut written = 0u64;
        for (hash, offset) in entries {
            let key = Key::Entry { cursor, hash }.encode();
            batch.push((key, encode_value(offset).to_vec()));
            if batch.len() == self.batch_size {
                written += self.write(cursor, &mut batch)?;
            }
        }
        if !batch.is_empty() {
            written += self.write(cursor, &mut batch)?;
        }
        debug!(cursor = %cursor, entries = written, "namespace written");
        Ok(written)
    }

    fn write(&self, cursor: Cursor, batch: &mut Vec<KvPair>) -> LayoutResult<u64> {
        self.store.write_batch(batch)?;
        let n = batch.len() as u64;
        debug!(cursor = %cursor, batch = n, "entry batch written");
        batch.clear();
        Ok(n)
    }

    /// Lazily scan every entry under `cursor`, ascending by the hash's
    /// canonical string. The order is unrelated to insertion order.
    pub fn scan_all(&self, cursor: Cursor) -> LayoutResult<EntryScan<'_>> {
        let inner = self.store.scan_prefix(&namespace_prefix(cursor))?;
        debug!(cursor = %cursor, "namespace scan started");
        Ok(EntryScan { cursor, inner })
    }

    /// Offset stored for one hash, if any.
    pub fn get_offset(&self, cursor: Cursor, hash: &ContentHash) -> LayoutResult<Option<u64>> {
        let key = Key::Entry {
            cursor,
            hash: *hash,
        }
        .encode();
        match self.store.get(&key)? {
            Some(raw) => Ok(Some(decode_value(&key, &raw)?)),
            None => Ok(None),
        }
    }

    /// Make the namespace's writes durable.
    ///
    /// The store offers no per-range sync, so this syncs the whole store.
    pub fn flush(&self, cursor: Cursor) -> LayoutResult<()> {
        self.store.sync()?;
        debug!(cursor = %cursor, "namespace flushed");
        Ok(())
    }
}

impl std::fmt::Debug for NamespaceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceStore")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

/// Lazy iterator over one namespace's entries.
pub struct EntryScan<'a> {
    cursor: Cursor,
    inner: ScanIter<'a>,
}

impl EntryScan<'_> {
    fn decode(&self, key: &[u8], value: &[u8]) -> LayoutResult<(ContentHash, u64)> {
        match Key::decode(key)? {
            Key::Entry { cursor, hash } if cursor == self.cursor => {
                Ok((hash, decode_value(key, value)?))
            }
            other => Err(LayoutError::key_decode(
                key,
                format!("expected an entry of namespace {}, found {other:?}", self.cursor),
            )),
        }
    }
}

impl Iterator for EntryScan<'_> {
    type Item = LayoutResult<(ContentHash, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = match self.inner.next()? {
            Ok(pair) => pair,
            Err(e) => return Some(Err(e.into())),
        };
        Some(self.decode(&key, &value))
    }
}
