use crate::error::StoreResult;

/// One stored `(key, value)` pair.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Lazy, ordered iterator returned by [`KvStore::scan_prefix`].
pub type ScanIter<'a> = Box<dyn Iterator<Item = StoreResult<KvPair>> + Send + 'a>;

/// Ordered key-value store.
///
/// All implementations must satisfy these invariants:
/// - Keys are ordered by raw byte comparison.
/// - `scan_prefix` yields exactly the keys starting with the prefix, in
///   ascending order, and is finite.
/// - `compare_and_swap` is atomic with respect to every other write.
/// - All I/O errors are propagated, never silently ignored.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Write (create or overwrite) `key`.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Scan every pair whose key starts with `prefix`, in key order.
    ///
    /// The scan reflects writes made while it is in progress only on a
    /// best-effort basis; callers must not scan a range that is being written.
    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<ScanIter<'_>>;

    /// Write `new` under `key` only if the current value equals `expected`
    /// (`None` meaning "absent"). Returns `true` if the write happened.
    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StoreResult<bool>;

    /// Bytes the store currently occupies.
    fn size_bytes(&self) -> StoreResult<u64>;

    /// Force previously written data to durable storage.
    ///
    /// Default implementation is a no-op for memory-only backends.
    fn sync(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Write multiple pairs.
    ///
    /// Default implementation calls `put()` for each pair and is not atomic.
    /// Backends may override for atomicity or fewer I/O round-trips.
    fn write_batch(&self, pairs: &[KvPair]) -> StoreResult<()> {
        for (key, value) in pairs {
            self.put(key, value)?;
        }
        Ok(())
    }
}
