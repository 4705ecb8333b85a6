use std::fs;
use std::path::{Path, PathBuf};

use dagkv_layout::DEFAULT_BATCH_SIZE;
use dagkv_store::SyncMode;
use dagkv_types::{Cursor, RESERVED_CURSORS};
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, BackendResult};

/// File name suffix of importable index files; the rest of the name is the
/// piece CID.
pub const DEFAULT_INDEX_SUFFIX: &str = ".full.idx";

/// Pipeline configuration, loadable from TOML. Missing keys take defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Directory of the durable store; `None` keeps everything in memory.
    pub store_path: Option<PathBuf>,
    pub sync_mode: SyncMode,
    /// Value the cursor counter is seeded with on a fresh store.
    pub first_cursor: u64,
    /// Entries per store batch when writing a namespace.
    pub write_batch_size: usize,
    /// Rebuild every imported index and compare it with its source.
    pub verify: bool,
    pub index_suffix: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            sync_mode: SyncMode::default(),
            first_cursor: RESERVED_CURSORS,
            write_batch_size: DEFAULT_BATCH_SIZE,
            verify: true,
            index_suffix: DEFAULT_INDEX_SUFFIX.to_string(),
        }
    }
}

impl BackendConfig {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> BackendResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> BackendResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| BackendError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> BackendResult<String> {
        toml::to_string_pretty(self).map_err(|e| BackendError::Config(e.to_string()))
    }

    pub fn validate(&self) -> BackendResult<()> {
        self.first_cursor()?;
        if self.write_batch_size == 0 {
            return Err(BackendError::Config("write_batch_size must be positive".into()));
        }
        if self.index_suffix.is_empty() {
            return Err(BackendError::Config("index_suffix must not be empty".into()));
        }
        Ok(())
    }

    pub fn first_cursor(&self) -> BackendResult<Cursor> {
        Cursor::new(self.first_cursor).map_err(|e| BackendError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = BackendConfig::default();
        assert!(c.store_path.is_none());
        assert_eq!(c.sync_mode, SyncMode::OsDefault);
        assert_eq!(c.first_cursor, 100);
        assert_eq!(c.write_batch_size, 1024);
        assert!(c.verify);
        assert_eq!(c.index_suffix, ".full.idx");
        c.validate().unwrap();
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = BackendConfig::from_toml_str(
            r#"
            store_path = "/var/lib/dagkv"
            sync_mode = "every_write"
            verify = false
            "#,
        )
        .unwrap();
        assert_eq!(c.store_path, Some(PathBuf::from("/var/lib/dagkv")));
        assert_eq!(c.sync_mode, SyncMode::EveryWrite);
        assert!(!c.verify);
        assert_eq!(c.write_batch_size, 1024);
    }

    #[test]
    fn toml_round_trip() {
        let c = BackendConfig {
            store_path: Some(PathBuf::from("data")),
            write_batch_size: 7,
            ..BackendConfig::default()
        };
        let text = c.to_toml_string().unwrap();
        assert_eq!(BackendConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn reserved_first_cursor_is_rejected() {
        let err = BackendConfig::from_toml_str("first_cursor = 99").unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(BackendConfig::from_toml_str("write_batch_size = 0").is_err());
    }

    #[test]
    fn unknown_sync_mode_is_rejected() {
        assert!(BackendConfig::from_toml_str(r#"sync_mode = "sometimes""#).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dagkv.toml");
        fs::write(&path, "first_cursor = 500\n").unwrap();
        assert_eq!(BackendConfig::load(&path).unwrap().first_cursor, 500);
    }
}
