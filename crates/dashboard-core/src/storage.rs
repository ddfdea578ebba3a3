//! Persistent key-value storage for session data.
//!
//! [`FileStore`] keeps a flat JSON object of string keys in
//! `<base>/session.json` with restricted permissions (0600). Every operation
//! re-reads the file and every write replaces it atomically (temp file +
//! rename), so separate processes always see a whole document.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::paths;

/// Session store filename.
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to {action} {path}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize store contents")]
    Serialize(#[from] serde_json::Error),
}

/// Narrow key-value interface the session store is written against.
///
/// `set_many` and `delete_many` default to one call per key; backends that
/// can apply a batch atomically should override them.
pub trait KeyValueStore {
    /// Returns the value for `key`, or `None` if absent.
    ///
    /// # Errors
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    /// Returns an error if the backing medium cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backing medium cannot be written.
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    /// Reads several keys. Backends that can should answer from one snapshot.
    ///
    /// # Errors
    /// Returns an error if the backing medium cannot be read.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// # Errors
    /// Returns an error if any write fails.
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns an error if any delete fails.
    fn delete_many(&mut self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }

    /// Deletes the given keys only if each still holds the expected value.
    ///
    /// Returns whether the keys were deleted.
    ///
    /// # Errors
    /// Returns an error if the backing medium cannot be read or written.
    fn delete_if_unchanged(&mut self, expected: &[(&str, &str)]) -> Result<bool, StoreError> {
        for (key, value) in expected {
            if self.get(key)?.as_deref() != Some(*value) {
                return Ok(false);
            }
        }
        let keys: Vec<&str> = expected.iter().map(|(key, _)| *key).collect();
        self.delete_many(&keys)?;
        Ok(true)
    }
}

/// In-process store. Contents are lost when the value is dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at the default location under the dashboard home.
    pub fn open_default() -> Self {
        Self::open(paths::dashboard_home().join(SESSION_FILE))
    }

    /// Store at an explicit path. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole document.
    ///
    /// A missing file is empty. A file that is not a JSON object of strings
    /// is also treated as empty; the next write replaces it.
    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    action: "read",
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "session file is malformed, treating as empty"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                action: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        write_restricted(&tmp_path, contents.as_bytes()).map_err(|source| StoreError::Io {
            action: "write",
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io {
            action: "replace",
            path: self.path.clone(),
            source,
        })
    }

    fn update(
        &mut self,
        apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StoreError> {
        let mut entries = self.load()?;
        let changed = apply(&mut entries);
        if changed || (self.path.exists() && entries.is_empty()) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Writes with 0600 permissions where the platform supports it.
fn write_restricted(path: &Path, contents: &[u8]) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(contents)
    }

    #[cfg(not(unix))]
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(contents)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let mut entries = self.load()?;
        Ok(keys.iter().map(|key| entries.remove(*key)).collect())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set_many(&[(key, value)])
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.delete_many(&[key])
    }

    fn set_many(&mut self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), (*value).to_string());
            }
            true
        })
    }

    fn delete_many(&mut self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(|entries| {
            let before = entries.len();
            entries.retain(|k, _| !keys.contains(&k.as_str()));
            entries.len() != before
        })
    }

    fn delete_if_unchanged(&mut self, expected: &[(&str, &str)]) -> Result<bool, StoreError> {
        let mut deleted = false;
        self.update(|entries| {
            let unchanged = expected
                .iter()
                .all(|(key, value)| entries.get(*key).map(String::as_str) == Some(*value));
            if unchanged {
                for (key, _) in expected {
                    entries.remove(*key);
                }
            }
            deleted = unchanged;
            unchanged
        })?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_memory_store_get_set_delete() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.delete("a").unwrap();
        store.delete("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("session.json"));
        assert_eq!(store.get("user").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut store = FileStore::open(&path);
        store
            .set_many(&[("isAuthenticated", "true"), ("user", "{}")])
            .unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(
            reopened.get("isAuthenticated").unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(reopened.get("user").unwrap().as_deref(), Some("{}"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_delete_many_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("session.json"));
        store.set("theme", "dark").unwrap();
        store.set("user", "{}").unwrap();

        store.delete_many(&["user", "isAuthenticated"]).unwrap();

        assert_eq!(store.get("user").unwrap(), None);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_store_malformed_file_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json at all").unwrap();

        let mut store = FileStore::open(&path);
        assert_eq!(store.get("user").unwrap(), None);

        store.set("user", "{}").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("not json"));
        assert!(contents.contains("\"user\""));
    }

    #[test]
    fn test_file_store_delete_on_malformed_file_resets_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2").unwrap();

        let mut store = FileStore::open(&path);
        store.delete("user").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "{}");
    }

    #[test]
    fn test_file_store_get_many_reads_one_document() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("session.json"));
        store.set_many(&[("isAuthenticated", "true"), ("user", "{}")]).unwrap();

        let values = store.get_many(&["isAuthenticated", "user", "theme"]).unwrap();
        assert_eq!(
            values,
            vec![Some("true".to_string()), Some("{}".to_string()), None]
        );
    }

    #[test]
    fn test_file_store_delete_if_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = FileStore::open(&path);
        store.set_many(&[("isAuthenticated", "true"), ("user", "new")]).unwrap();

        assert!(!store
            .delete_if_unchanged(&[("isAuthenticated", "true"), ("user", "old")])
            .unwrap());
        assert_eq!(store.get("user").unwrap().as_deref(), Some("new"));

        assert!(store
            .delete_if_unchanged(&[("isAuthenticated", "true"), ("user", "new")])
            .unwrap());
        assert_eq!(store.get_many(&["isAuthenticated", "user"]).unwrap(), vec![None, None]);
    }

    #[test]
    fn test_memory_store_delete_if_unchanged() {
        let mut store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        assert!(!store.delete_if_unchanged(&[("a", "1"), ("b", "3")]).unwrap());
        assert_eq!(store.len(), 2);
        assert!(store.delete_if_unchanged(&[("a", "1"), ("b", "2")]).unwrap());
        assert!(store.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = FileStore::open(&path);
        store.set("isAuthenticated", "true").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
