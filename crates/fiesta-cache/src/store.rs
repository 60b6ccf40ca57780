//! Raw byte stores behind the typed [`Cache`](crate::Cache).

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::CacheError;

/// A synchronous key/value store of raw bytes.
///
/// Writes must be durable before `set` returns: callers rely on a value read
/// back after a restart being the last value written.
pub trait KvStore: Send + Sync {
    /// Get the bytes stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Check whether `key` exists.
    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }

    /// List every key in the store.
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

/// In-process store. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CacheError {
    CacheError::StoreError("memory store lock poisoned".to_string())
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Directory-backed store: one file per key.
///
/// File names are the URL-safe base64 encoding of the key, so any key is a
/// valid file name. Each write goes to a temporary file that is renamed over
/// the target, so a crash mid-write never leaves a truncated value behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

const ENTRY_EXTENSION: &str = "json";

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, CacheError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            CacheError::OpenError(format!("{}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    /// The directory holding the entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name = URL_SAFE_NO_PAD.encode(key.as_bytes());
        self.root.join(format!("{}.{}", name, ENTRY_EXTENSION))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let target = self.path_for(key);
        let tmp = target.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        tracing::trace!(key, bytes = value.len(), "wrote store entry");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.path_for(key).is_file())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(bytes) = URL_SAFE_NO_PAD.decode(stem) {
                if let Ok(key) = String::from_utf8(bytes) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        assert!(store.exists("a").unwrap());

        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_memory_store_delete_missing_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete("nope").is_ok());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.set("cart:sess_1", b"{\"items\":[]}").unwrap();
        }

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("cart:sess_1").unwrap(),
            Some(b"{\"items\":[]}".to_vec())
        );
        assert_eq!(reopened.keys().unwrap(), vec!["cart:sess_1".to_string()]);
    }

    #[test]
    fn test_file_store_keys_with_path_characters() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("session:../../etc", b"x").unwrap();

        assert!(store.exists("session:../../etc").unwrap());
        assert_eq!(store.keys().unwrap(), vec!["session:../../etc".to_string()]);
    }

    #[test]
    fn test_file_store_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("missing").unwrap(), None);
        assert!(!store.exists("missing").unwrap());
        assert!(store.delete("missing").is_ok());
    }
}
