//! JSON persistence for the website collection.
//!
//! The document is `{ "websites": [...], "isEnabled": bool }` and lives in
//! the application data directory. Writes go to a temp file in the same
//! directory which is then renamed over the target.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::model::Website;
use crate::cache::get_data_dir;

/// Store file name inside the data directory.
pub const STORE_FILE_NAME: &str = "websites.json";

/// Errors raised while reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode websites: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Everything persisted between launches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub websites: Vec<Website>,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

const fn default_enabled() -> bool { true }

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            websites: Vec::new(),
            is_enabled: true,
        }
    }
}

/// File-backed website store.
#[derive(Debug, Clone)]
pub struct WebsiteStore {
    path: PathBuf,
}

impl WebsiteStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    /// The store at its default location in the data directory.
    #[must_use]
    pub fn default_location() -> Self { Self::new(get_data_dir().join(STORE_FILE_NAME)) }

    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Loads the snapshot.
    ///
    /// A missing file yields an empty snapshot. A file that cannot be parsed
    /// is moved aside to `*.bak` and an empty snapshot is returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be read.
    pub fn load(&self) -> Result<StoreSnapshot, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no website store yet");
                return Ok(StoreSnapshot::default());
            }
            Err(source) => {
                return Err(StoreError::Io { path: self.path.clone(), source });
            }
        };

        match serde_json::from_str::<StoreSnapshot>(&content) {
            Ok(snapshot) => {
                tracing::debug!(
                    path = %self.path.display(),
                    count = snapshot.websites.len(),
                    "loaded website store"
                );
                Ok(snapshot)
            }
            Err(err) => {
                let backup = self.backup_path();
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %err,
                    "website store is corrupt, moving it aside"
                );
                if let Err(rename_err) = std::fs::rename(&self.path, &backup) {
                    tracing::warn!(error = %rename_err, "failed to back up corrupt store");
                }
                Ok(StoreSnapshot::default())
            }
        }
    }

    /// Writes the snapshot atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        let parent = self.path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        std::fs::create_dir_all(&parent).map_err(|source| StoreError::Io {
            path: parent.clone(),
            source,
        })?;

        let json = serde_json::to_vec_pretty(snapshot)?;

        let io_err = |source| StoreError::Io { path: self.path.clone(), source };
        let mut file = NamedTempFile::new_in(&parent).map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&self.path).map_err(|err| io_err(err.error))?;

        tracing::trace!(path = %self.path.display(), count = snapshot.websites.len(), "saved websites");
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
        name.push(".bak");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> WebsiteStore {
        WebsiteStore::new(dir.path().join("nested").join(STORE_FILE_NAME))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = store_in(&dir).load().unwrap();
        assert!(snapshot.websites.is_empty());
        assert!(snapshot.is_enabled);
    }

    #[test]
    fn test_save_then_load_preserves_order_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut first = Website::new(Url::parse("https://a.com").unwrap(), "A");
        first.is_current = true;
        let second = Website::new(Url::parse("https://b.com").unwrap(), "B");
        let snapshot = StoreSnapshot {
            websites: vec![first, second],
            is_enabled: false,
        };

        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let store = WebsiteStore::new(dir.path().join(STORE_FILE_NAME));
        std::fs::write(store.path(), "{ not json").unwrap();

        let snapshot = store.load().unwrap();
        assert!(snapshot.websites.is_empty());
        assert!(!store.path().exists());
        assert!(dir.path().join("websites.json.bak").exists());
    }

    #[test]
    fn test_missing_enabled_flag_defaults_to_true() {
        let dir = tempfile::tempdir().unwrap();
        let store = WebsiteStore::new(dir.path().join(STORE_FILE_NAME));
        std::fs::write(store.path(), r#"{ "websites": [] }"#).unwrap();
        assert!(store.load().unwrap().is_enabled);
    }

    #[test]
    fn test_store_document_uses_camel_case() {
        let json = serde_json::to_string(&StoreSnapshot::default()).unwrap();
        assert_eq!(json, r#"{"websites":[],"isEnabled":true}"#);
    }
}
