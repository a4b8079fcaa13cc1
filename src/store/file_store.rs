//! store::file_store
//!
//! File-based durable store.
//!
//! # Layout
//!
//! - `<dir>/<namespace>.toml` - flat TOML table of key/value strings
//! - `<dir>/<namespace>.lock` - exclusive lock file for writers
//!
//! Writes are read-modify-write under the namespace lock, then atomic
//! (write to temp file, then rename), so concurrent processes sharing a
//! namespace never lose each other's keys.
//!
//! # Example
//!
//! ```no_run
//! use seqgen::store::{FileStore, KeyValueStore};
//! use std::path::PathBuf;
//!
//! let store = FileStore::new(PathBuf::from("/var/lib/seqgen"), "sequence");
//! store.put("seq_id", "12").unwrap();
//! assert_eq!(store.get("seq_id").unwrap().as_deref(), Some("12"));
//! ```

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::lock::{StoreLock, DEFAULT_LOCK_TIMEOUT};
use super::traits::{KeyValueStore, StoreError};

/// File-based key/value store for one namespace.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Path to the namespace data file
    path: PathBuf,
    /// Path to the namespace lock file
    lock_path: PathBuf,
}

impl FileStore {
    /// Create a store for `namespace` inside `dir`.
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(dir: PathBuf, namespace: &str) -> Self {
        Self {
            path: dir.join(format!("{}.toml", namespace)),
            lock_path: dir.join(format!("{}.lock", namespace)),
        }
    }

    /// Get the path to the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries from the file.
    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            StoreError::ReadError(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            StoreError::ReadError(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }

    /// Write entries with atomic rename and owner-only permissions.
    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(entries)
            .map_err(|e| StoreError::WriteError(format!("cannot serialize store: {}", e)))?;

        let temp_path = self.path.with_extension("toml.tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| StoreError::WriteError(format!("cannot create temp file: {}", e)))?;

            #[cfg(unix)]
            {
                let permissions = fs::Permissions::from_mode(0o600);
                file.set_permissions(permissions).map_err(|e| {
                    StoreError::WriteError(format!("cannot set permissions: {}", e))
                })?;
            }

            file.write_all(content.as_bytes())
                .map_err(|e| StoreError::WriteError(format!("cannot write store: {}", e)))?;

            file.sync_all()
                .map_err(|e| StoreError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| StoreError::WriteError(format!("cannot rename temp file: {}", e)))?;

        Ok(())
    }

    /// Apply `mutate` to the entries while holding the namespace lock.
    fn update<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _lock = StoreLock::acquire(&self.lock_path, DEFAULT_LOCK_TIMEOUT)?;
        let mut entries = self.read_entries()?;
        mutate(&mut entries);
        self.write_entries(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.read_entries()?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
