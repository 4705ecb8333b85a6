use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use dagkv_index::CarIndex;
use dagkv_layout::keys::VALUE_WIDTH;
use dagkv_layout::{CursorAllocator, NamespaceStore, PieceRegistry};
use dagkv_store::{FileKvStore, InMemoryKvStore, KvStore, LogConfig};
use dagkv_types::{ContentHash, Cursor, PieceCid};
use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::adapter;
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};
use crate::verify;

/// Outcome of importing one piece.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub piece: PieceCid,
    pub cursor: Cursor,
    pub entries: u64,
    pub verified: bool,
}

/// Outcome of importing a directory of index files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub pieces: usize,
    pub entries: u64,
    /// Bytes of the imported index files.
    pub index_bytes: u64,
    /// Bytes the store occupies after the import.
    pub store_bytes: u64,
    /// Bytes spent on registry values, one counter value per piece.
    pub cursor_overhead_bytes: u64,
    pub reports: Vec<ImportReport>,
}

impl ImportSummary {
    fn record(&mut self, report: ImportReport, file_bytes: u64) {
        self.pieces += 1;
        self.entries += report.entries;
        self.index_bytes += file_bytes;
        self.cursor_overhead_bytes += VALUE_WIDTH as u64;
        self.reports.push(report);
    }
}

/// The import pipeline over one ordered store.
///
/// Importing a piece allocates a fresh cursor, writes every entry under
/// it, makes the writes durable and only then binds the piece to the
/// cursor, so a registry entry never points at a namespace that is still
/// being written. Re-importing a piece orphans its previous namespace.
pub struct Backend {
    store: Arc<dyn KvStore>,
    config: BackendConfig,
    cursors: CursorAllocator,
    registry: PieceRegistry,
    namespaces: NamespaceStore,
}

impl Backend {
    /// Open the store named by `config` (in memory when it names none).
    pub fn open(config: BackendConfig) -> BackendResult<Self> {
        config.validate()?;
        let store: Arc<dyn KvStore> = match &config.store_path {
            Some(dir) => Arc::new(FileKvStore::open(
                dir,
                LogConfig {
                    sync_mode: config.sync_mode,
                },
            )?),
            None => Arc::new(InMemoryKvStore::new()),
        };
        Self::with_store(store, config)
    }

    /// Run the pipeline over an existing store. The cursor counter is
    /// seeded from the config only if the store has never been seeded.
    pub fn with_store(store: Arc<dyn KvStore>, config: BackendConfig) -> BackendResult<Self> {
        config.validate()?;
        let cursors = CursorAllocator::new(Arc::clone(&store));
        let next = cursors.ensure_initialized(config.first_cursor()?)?;
        info!(next_cursor = %next, verify = config.verify, "backend ready");
        Ok(Self {
            registry: PieceRegistry::new(Arc::clone(&store)),
            namespaces: NamespaceStore::new(Arc::clone(&store))
                .with_batch_size(config.write_batch_size),
            cursors,
            store,
            config,
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn cursors(&self) -> &CursorAllocator {
        &self.cursors
    }

    pub fn registry(&self) -> &PieceRegistry {
        &self.registry
    }

    pub fn namespaces(&self) -> &NamespaceStore {
        &self.namespaces
    }

    /// Write `index` into a fresh namespace and bind `piece` to it.
    pub fn store_index(&self, piece: &PieceCid, index: &CarIndex) -> BackendResult<ImportReport> {
        let report = self.write_namespace(piece, index)?;
        self.registry.bind(piece, report.cursor)?;
        Ok(report)
    }

    /// Allocate a cursor and durably write every entry of `index` under it.
    /// The piece is not bound yet.
    fn write_namespace(&self, piece: &PieceCid, index: &CarIndex) -> BackendResult<ImportReport> {
        let entries = adapter::export(index)?;
        let cursor = self.cursors.allocate()?;
        let written = self.namespaces.put_all(cursor, entries)?;
        self.namespaces.flush(cursor)?;
        debug!(piece = %piece, cursor = %cursor, entries = written, "namespace written");
        Ok(ImportReport {
            piece: *piece,
            cursor,
            entries: written,
            verified: false,
        })
    }

    /// Rebuild the index of `piece` from its namespace.
    pub fn load_index(&self, piece: &PieceCid) -> BackendResult<CarIndex> {
        let cursor = self.registry.lookup(piece)?;
        adapter::try_import(self.namespaces.scan_all(cursor)?)
    }

    /// Store `index`, then (when verification is on) rebuild it and require
    /// byte-identical canonical forms. The piece is bound only once the
    /// namespace has passed verification, so a failed import leaves any
    /// earlier binding in place.
    pub fn import_and_verify(
        &self,
        piece: &PieceCid,
        index: &CarIndex,
    ) -> BackendResult<ImportReport> {
        let mut report = self.write_namespace(piece, index)?;
        if self.config.verify {
            let rebuilt = adapter::try_import(self.namespaces.scan_all(report.cursor)?)?;
            verify::ensure_identical(piece, index, &rebuilt)?;
            report.verified = true;
        }
        self.registry.bind(piece, report.cursor)?;
        info!(
            piece = %piece,
            cursor = %report.cursor,
            entries = report.entries,
            verified = report.verified,
            "piece imported"
        );
        Ok(report)
    }

    /// Import one codec-tagged index file.
    pub fn import_file(&self, piece: &PieceCid, path: &Path) -> BackendResult<ImportReport> {
        let mut reader = BufReader::new(File::open(path)?);
        let index = CarIndex::read_from(&mut reader)?;
        debug!(path = %path.display(), entries = index.len(), "index file read");
        self.import_and_verify(piece, &index)
    }

    /// Import every `<piece-cid><suffix>` file directly inside `dir`, in
    /// file name order. The first failure stops the import.
    pub fn import_dir(&self, dir: &Path) -> BackendResult<ImportSummary> {
        let mut summary = ImportSummary::default();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(piece) = self.piece_from_path(entry.path())? else {
                continue;
            };
            let file_bytes = entry.metadata().map_err(std::io::Error::from)?.len();
            summary.record(self.import_file(&piece, entry.path())?, file_bytes);
        }
        summary.store_bytes = self.store.size_bytes()?;
        info!(
            dir = %dir.display(),
            pieces = summary.pieces,
            entries = summary.entries,
            index_bytes = summary.index_bytes,
            store_bytes = summary.store_bytes,
            cursor_overhead_bytes = summary.cursor_overhead_bytes,
            "directory imported"
        );
        Ok(summary)
    }

    /// The piece named by an index file, or `None` if the file does not
    /// carry the index suffix.
    fn piece_from_path(&self, path: &Path) -> BackendResult<Option<PieceCid>> {
        let invalid = |reason: String| BackendError::InvalidFileName {
            path: path.to_path_buf(),
            reason,
        };
        let Some(name) = path.file_name() else {
            return Ok(None);
        };
        let Some(name) = name.to_str() else {
            return if name.to_string_lossy().ends_with(&self.config.index_suffix) {
                Err(invalid("file name is not UTF-8".into()))
            } else {
                Ok(None)
            };
        };
        let Some(stem) = name.strip_suffix(self.config.index_suffix.as_str()) else {
            return Ok(None);
        };
        PieceCid::parse(stem)
            .map(Some)
            .map_err(|e| invalid(e.to_string()))
    }

    /// Offset of `hash` inside `piece`, if the piece holds it.
    pub fn offset(&self, piece: &PieceCid, hash: &ContentHash) -> BackendResult<Option<u64>> {
        let cursor = self.registry.lookup(piece)?;
        Ok(self.namespaces.get_offset(cursor, hash)?)
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
