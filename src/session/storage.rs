//! Persistent Key-Value Storage
//!
//! A small local-storage style map persisted as JSON in the data
//! directory. The session token lives under [`TOKEN_KEY`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::session::error::{StorageError, StorageResult};

/// Key the auth token is stored under
pub const TOKEN_KEY: &str = "token";

/// File name inside the data directory
pub const STORAGE_FILE: &str = "storage.json";

/// Single persistent slot for the auth token
pub trait TokenStore: Send + Sync {
    fn load_token(&self) -> StorageResult<Option<String>>;

    fn save_token(&self, token: &str) -> StorageResult<()>;

    /// Removing an absent token is not an error
    fn clear_token(&self) -> StorageResult<()>;
}

/// JSON file backed key-value store
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl LocalStorage {
    /// Storage file inside `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at(data_dir.as_ref().join(STORAGE_FILE))
    }

    /// Storage at an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.read_map()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.guard()?;
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    pub fn remove_item(&self, key: &str) -> StorageResult<()> {
        let _guard = self.guard()?;
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn guard(&self) -> StorageResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| StorageError::Io(std::io::Error::other("storage lock poisoned")))
    }

    fn read_map(&self) -> StorageResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to a sibling temp file, then rename over the original
    fn write_map(&self, map: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TokenStore for LocalStorage {
    fn load_token(&self) -> StorageResult<Option<String>> {
        Ok(self.get_item(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    fn save_token(&self, token: &str) -> StorageResult<()> {
        self.set_item(TOKEN_KEY, token)
    }

    fn clear_token(&self) -> StorageResult<()> {
        self.remove_item(TOKEN_KEY)
    }
}

/// In-process token slot, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    token: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    fn slot(&self) -> StorageResult<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| StorageError::Io(std::io::Error::other("token slot poisoned")))
    }
}

impl TokenStore for MemoryStorage {
    fn load_token(&self) -> StorageResult<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn save_token(&self, token: &str) -> StorageResult<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> StorageResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_token_persists_across_instances() {
        let dir = tempdir().unwrap();

        let storage = LocalStorage::new(dir.path());
        assert_eq!(storage.load_token().unwrap(), None);
        storage.save_token("abc123").unwrap();

        let reopened = LocalStorage::new(dir.path());
        assert_eq!(reopened.load_token().unwrap().as_deref(), Some("abc123"));
        assert!(reopened.path().ends_with(STORAGE_FILE));
    }

    #[test]
    fn test_clear_token_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.set_item("theme", "dark").unwrap();
        storage.save_token("abc123").unwrap();
        storage.clear_token().unwrap();

        assert_eq!(storage.load_token().unwrap(), None);
        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_clear_missing_token_is_ok() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested"));

        storage.clear_token().unwrap();
        storage.clear_token().unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        std::fs::write(storage.path(), "{not json").unwrap();

        assert!(matches!(
            storage.load_token(),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::with_token("t1");
        assert_eq!(storage.load_token().unwrap().as_deref(), Some("t1"));

        storage.clear_token().unwrap();
        assert_eq!(storage.load_token().unwrap(), None);
    }
}
