use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryKvStore;
use crate::traits::{KvPair, KvStore, ScanIter};

/// Name of the log file inside a store directory.
pub const LOG_FILE_NAME: &str = "dagkv.log";

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Flush/sync strategy for the log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every write (safest, highest latency).
    EveryWrite,
    /// Rely on OS page-cache buffering until [`KvStore::sync`] is called.
    #[default]
    OsDefault,
}

/// Configuration for a [`FileKvStore`].
#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    /// Sync/flush strategy.
    pub sync_mode: SyncMode,
}

/// A single logged mutation.
///
/// On-disk format:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized LogRecord)]
/// ```
#[derive(Debug, Serialize, Deserialize)]
enum LogRecord {
    Put { key: Vec<u8>, value: Vec<u8> },
    Batch(Vec<KvPair>),
}

/// The file under a log: appendable, truncatable, syncable.
trait LogFile: Write {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync_data(&mut self) -> io::Result<()>;
    fn sync_all(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn sync_all(&mut self) -> io::Result<()> {
        File::sync_all(self)
    }
}

struct LogWriter<F = File> {
    file: F,
    /// End of the last fully written record.
    offset: u64,
    /// Set when a failed append could not be cut back to `offset`.
    broken: bool,
}

impl<F: LogFile> LogWriter<F> {
    fn new(file: F, offset: u64) -> Self {
        Self {
            file,
            offset,
            broken: false,
        }
    }

    /// Append one framed record. On failure the file is cut back to the
    /// previous record boundary, so a rejected write is never replayed and
    /// never shields later records from replay.
    fn append(&mut self, record: &LogRecord, sync_mode: SyncMode) -> StoreResult<()> {
        if self.broken {
            return Err(StoreError::Unwritable {
                offset: self.offset,
            });
        }
        let frame = encode_frame(record)?;
        let written = self.file.write_all(&frame).and_then(|()| self.file.flush());
        let synced = written.and_then(|()| match sync_mode {
            SyncMode::EveryWrite => self.file.sync_data(),
            SyncMode::OsDefault => Ok(()),
        });
        if let Err(e) = synced {
            if let Err(cut) = self.file.truncate(self.offset) {
                warn!(offset = self.offset, error = %cut, "cannot roll back failed append");
                self.broken = true;
            } else {
                debug!(offset = self.offset, error = %e, "failed append rolled back");
            }
            return Err(e.into());
        }
        self.offset += frame.len() as u64;
        Ok(())
    }

    fn sync(&mut self) -> StoreResult<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// `[len][crc][payload]` for one record.
fn encode_frame(record: &LogRecord) -> StoreResult<Vec<u8>> {
    let payload =
        bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len()).map_err(|_| {
        StoreError::Serialization(format!("record of {} bytes is too large", payload.len()))
    })?;
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Durable ordered store: an in-memory table rebuilt from an append-only log.
///
/// Every mutation is appended to the log before it becomes visible in the
/// table. A batch is one log record, so it is recovered all-or-nothing.
/// On open, the log is replayed front-to-back; replay stops at the first
/// torn or CRC-failing record and the file is truncated back to the last
/// good record.
pub struct FileKvStore {
    path: PathBuf,
    table: InMemoryKvStore,
    writer: Mutex<LogWriter>,
    config: LogConfig,
}

impl FileKvStore {
    /// Open (or create) a store in `dir`.
    pub fn open(dir: &Path, config: LogConfig) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE_NAME);

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        let file_len = file.metadata()?.len();

        let table = InMemoryKvStore::new();
        let (records, good_len) = replay(&path, file_len)?;
        for record in &records {
            match record {
                LogRecord::Put { key, value } => table.put(key, value)?,
                LogRecord::Batch(pairs) => table.apply_batch(pairs)?,
            }
        }

        if good_len < file_len {
            warn!(
                path = %path.display(),
                good_len,
                file_len,
                "discarding damaged log tail"
            );
            file.set_len(good_len)?;
            file.sync_all()?;
        }

        info!(
            path = %path.display(),
            records = records.len(),
            keys = table.len(),
            "opened file store"
        );

        Ok(Self {
            path,
            table,
            writer: Mutex::new(LogWriter::new(file, good_len)),
            config,
        })
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current end of the log, in bytes.
    pub fn log_len(&self) -> StoreResult<u64> {
        Ok(self.lock_writer()?.offset)
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn lock_writer(&self) -> StoreResult<MutexGuard<'_, LogWriter>> {
        self.writer.lock().map_err(|_| StoreError::Poisoned)
    }

    fn append(&self, w: &mut LogWriter, record: &LogRecord) -> StoreResult<()> {
        w.append(record, self.config.sync_mode)
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.table.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut w = self.lock_writer()?;
        self.append(
            &mut w,
            &LogRecord::Put {
                key: key.to_vec(),
                value: value.to_vec(),
            },
        )?;
        self.table.put(key, value)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<ScanIter<'_>> {
        self.table.scan_prefix(prefix)
    }

    fn size_bytes(&self) -> StoreResult<u64> {
        self.log_len()
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> StoreResult<bool> {
        // Holding the writer excludes every other mutation of the table.
        let mut w = self.lock_writer()?;
        if self.table.get(key)?.as_deref() != expected {
            return Ok(false);
        }
        self.append(
            &mut w,
            &LogRecord::Put {
                key: key.to_vec(),
                value: new.to_vec(),
            },
        )?;
        self.table.put(key, new)?;
        Ok(true)
    }

    fn sync(&self) -> StoreResult<()> {
        let mut w = self.lock_writer()?;
        w.sync()?;
        debug!(offset = w.offset, "log synced");
        Ok(())
    }

    fn write_batch(&self, pairs: &[KvPair]) -> StoreResult<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let mut w = self.lock_writer()?;
        self.append(&mut w, &LogRecord::Batch(pairs.to_vec()))?;
        self.table.apply_batch(pairs)?;
        debug!(pairs = pairs.len(), offset = w.offset, "batch appended");
        Ok(())
    }
}

impl std::fmt::Debug for FileKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKvStore")
            .field("path", &self.path)
            .field("key_count", &self.table.len())
            .finish()
    }
}

/// Read every intact record from the log.
///
/// Returns the records and the byte length of the intact prefix.
fn replay(path: &Path, file_len: u64) -> StoreResult<(Vec<LogRecord>, u64)> {
    let mut file = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    let mut offset: u64 = 0;

    while offset + HEADER_SIZE as u64 <= file_len {
        let mut header = [0u8; HEADER_SIZE];
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length == 0 || offset + HEADER_SIZE as u64 + length as u64 > file_len {
            warn!(offset, length, file_len, "torn log record; stopping replay");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match file.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(offset, "truncated log record; stopping replay");
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; stopping replay"
            );
            break;
        }

        let record: LogRecord = bincode::deserialize(&payload).map_err(|e| StoreError::Corrupt {
            offset,
            reason: e.to_string(),
        })?;
        records.push(record);
        offset += HEADER_SIZE as u64 + length as u64;
    }

    debug!(records = records.len(), "log replay complete");
    Ok((records, offset))
}
