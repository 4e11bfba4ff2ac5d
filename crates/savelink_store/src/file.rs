//! File-backed store for persistent local data.

use crate::error::{StoreError, StoreResult};
use crate::kv::KvStore;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A file-backed key-value store.
///
/// All keys live in a single JSON object file. Every `set` and
/// `delete` writes through to disk, so data written before a crash is
/// observable after restart.
///
/// # Durability
///
/// Writes go to a temporary sibling file which is renamed over the
/// store file, so readers never observe a half-written store.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```no_run
/// use savelink_store::{KvStore, FileStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("save_data.json")).unwrap();
/// store.set("acct1.Stats", "[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens or creates a file store at the given path.
    ///
    /// If the file exists its contents are loaded; otherwise the
    /// store starts empty and the file is created on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds something
    /// other than a JSON object of strings.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let data = if path.exists() {
            let raw = fs::read_to_string(path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)
                    .map_err(|e| StoreError::Corrupted(format!("{}: {e}", path.display())))?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            data: Mutex::new(data),
        })
    }

    /// Opens or creates a file store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file
    /// cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> StoreResult<()> {
        let raw = serde_json::to_string(data)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(raw.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<String> {
        Ok(self.data.lock().get(key).cloned().unwrap_or_default())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.lock();
        let previous = data.insert(key.to_string(), value.to_string());

        if let Err(e) = self.persist(&data) {
            // Roll back the in-memory map so it matches the file.
            match previous {
                Some(prev) => data.insert(key.to_string(), prev),
                None => data.remove(key),
            };
            if let StoreError::Io(io) = &e {
                if io.kind() == std::io::ErrorKind::StorageFull {
                    return Err(StoreError::StorageFull {
                        key: key.to_string(),
                        len: value.len(),
                    });
                }
            }
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let mut data = self.data.lock();
        if data.remove(key).is_some() {
            self.persist(&data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save.json");

        let store = FileStore::open(&path).unwrap();
        store.set("acct1.UI", "[]").unwrap();
        store.set("acct1.Scenes", "MainScene").unwrap();

        assert_eq!(store.get("acct1.UI").unwrap(), "[]");
        assert_eq!(store.get("acct1.Scenes").unwrap(), "MainScene");
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("auth.access_token", "abc").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("auth.access_token").unwrap(), "abc");
    }

    #[test]
    fn file_store_delete_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("k", "v").unwrap();
            store.delete("k").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap(), "");
    }

    #[test]
    fn file_store_rejects_corrupted_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save.json");
        fs::write(&path, "not json at all {{{").unwrap();

        let result = FileStore::open(&path);
        assert!(matches!(result, Err(StoreError::Corrupted(_))));
    }

    #[test]
    fn file_store_empty_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save.json");
        fs::write(&path, "").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), "");
    }

    #[test]
    fn file_store_create_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deep/save.json");

        let store = FileStore::open_with_create_dirs(&path).unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), "v");
    }
}
