use std::collections::{BTreeMap, VecDeque};
use std::ops::Bound;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::{KvPair, KvStore, ScanIter};

/// Number of pairs a scan copies out per lock acquisition.
const SCAN_PAGE_SIZE: usize = 256;

type Table = RwLock<BTreeMap<Vec<u8>, Vec<u8>>>;

/// In-memory, `BTreeMap`-based ordered store.
///
/// Intended for tests and embedding. The table lives behind a `RwLock`;
/// scans copy pairs out a page at a time.
pub struct InMemoryKvStore {
    table: Table,
}

impl InMemoryKvStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.table.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored keys and values.
    pub fn total_bytes(&self) -> StoreResult<u64> {
        let table = self.table.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum())
    }

    pub(crate) fn apply_batch(&self, pairs: &[KvPair]) -> StoreResult<()> {
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        for (key, value) in pairs {
            table.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let table = self.table.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        table.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<ScanIter<'_>> {
        Ok(Box::new(PrefixScan::new(&self.table, prefix)))
    }

    fn size_bytes(&self) -> StoreResult<u64> {
        self.total_bytes()
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StoreResult<bool> {
        let mut table = self.table.write().map_err(|_| StoreError::Poisoned)?;
        if table.get(key).map(Vec::as_slice) != expected {
            return Ok(false);
        }
        table.insert(key.to_vec(), new.to_vec());
        Ok(true)
    }

    fn write_batch(&self, pairs: &[KvPair]) -> StoreResult<()> {
        self.apply_batch(pairs)
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("key_count", &self.len())
            .finish()
    }
}

/// Lazy prefix scan over a locked table.
///
/// Pages are fetched by resuming strictly after the last key handed out,
/// so the read lock is released between pages.
struct PrefixScan<'a> {
    table: &'a Table,
    prefix: Vec<u8>,
    resume_after: Option<Vec<u8>>,
    page: VecDeque<KvPair>,
    exhausted: bool,
}

impl<'a> PrefixScan<'a> {
    fn new(table: &'a Table, prefix: &[u8]) -> Self {
        Self {
            table,
            prefix: prefix.to_vec(),
            resume_after: None,
            page: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fill(&mut self) -> StoreResult<()> {
        let lock = self.table;
        let table = lock.read().map_err(|_| StoreError::Poisoned)?;
        let lower = match self.resume_after.take() {
            Some(last) => Bound::Excluded(last),
            None => Bound::Included(self.prefix.clone()),
        };
        let page: Vec<KvPair> = table
            .range::<Vec<u8>, _>((lower, Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(&self.prefix))
            .take(SCAN_PAGE_SIZE)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if page.len() < SCAN_PAGE_SIZE {
            self.exhausted = true;
        }
        self.resume_after = page.last().map(|(k, _)| k.clone());
        self.page.extend(page);
        Ok(())
    }
}

impl Iterator for PrefixScan<'_> {
    type Item = StoreResult<KvPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.exhausted {
            if let Err(e) = self.fill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.page.pop_front().map(Ok)
    }
}
