//! Key-Value store wrapper with automatic serialization.

use std::path::Path;
use std::sync::Arc;

use crate::store::{FileStore, KvStore, MemoryStore};
use crate::CacheError;
use serde::{de::DeserializeOwned, Serialize};

/// Type-safe cache over a [`KvStore`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Cloning a `Cache` shares the store.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Create a cache over any store.
    pub fn with_store(store: impl KvStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a cache held entirely in memory.
    pub fn memory() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Open a directory-backed cache.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cache = Cache::open_dir(".fiesta/store")?;
    /// ```
    pub fn open_dir(root: impl AsRef<Path>) -> Result<Self, CacheError> {
        Ok(Self::with_store(FileStore::open(root)?))
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, &bytes)
    }

    /// Delete a value from the cache.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key)
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store.exists(key)
    }

    /// Get all keys in the cache.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.store.keys()
    }

    /// Get all keys that start with `prefix`.
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust
/// let key = fiesta_cache::cache_key!("cart", "sess_123");
/// assert_eq!(key, "cart:sess_123");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}
