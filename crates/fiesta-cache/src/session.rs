//! Per-session values stored in the cache.

use crate::{Cache, CacheError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Maximum retry attempts for optimistic concurrency control.
const MAX_UPDATE_RETRIES: u32 = 3;

/// A unique browsing-session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random session ID.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("sess_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A value stored for one session, with bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData<T> {
    /// The session ID.
    pub id: SessionId,
    /// User-defined session data.
    pub data: T,
    /// Incremented on every write.
    pub version: u64,
    /// When the entry was first written (Unix timestamp).
    pub created_at: u64,
    /// When the entry was last written (Unix timestamp).
    pub last_accessed: u64,
}

/// Namespaced, per-session storage of a single value type.
///
/// Entries live under `<namespace>:<session id>`, so a cart store and an
/// auth session store can share one cache without colliding.
///
/// # Example
///
/// ```rust
/// use fiesta_cache::{Cache, Session, SessionId};
///
/// let carts = Session::<Vec<String>>::new(Cache::memory(), "cart");
/// let id = SessionId::from("sess_abc");
///
/// let mut items = carts.get_or_create(&id).unwrap();
/// items.push("tent".to_string());
/// carts.set(&id, &items).unwrap();
///
/// assert_eq!(carts.get(&id).unwrap(), Some(vec!["tent".to_string()]));
/// ```
#[derive(Debug, Clone)]
pub struct Session<T> {
    cache: Cache,
    namespace: String,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Session<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Create a session store in `namespace`.
    pub fn new(cache: Cache, namespace: impl Into<String>) -> Self {
        Self {
            cache,
            namespace: namespace.into(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// The namespace prefix used for keys.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get session data, or create a new session if it doesn't exist.
    pub fn get_or_create(&self, id: &SessionId) -> Result<T, CacheError> {
        match self.get_versioned(id)? {
            Some(session_data) => Ok(session_data.data),
            None => {
                let data = T::default();
                self.write(id, &data, None)?;
                Ok(data)
            }
        }
    }

    /// Get session data if it exists.
    pub fn get(&self, id: &SessionId) -> Result<Option<T>, CacheError> {
        Ok(self.get_versioned(id)?.map(|s| s.data))
    }

    /// Get full session data including version.
    pub fn get_versioned(&self, id: &SessionId) -> Result<Option<SessionData<T>>, CacheError> {
        self.cache.get::<SessionData<T>>(&self.session_key(id))
    }

    /// Set session data (unconditional write).
    pub fn set(&self, id: &SessionId, data: &T) -> Result<(), CacheError> {
        let previous = self.get_versioned(id)?;
        self.write(id, data, previous.as_ref())
    }

    /// Delete a session.
    pub fn delete(&self, id: &SessionId) -> Result<(), CacheError> {
        self.cache.delete(&self.session_key(id))
    }

    /// Check if a session exists.
    pub fn exists(&self, id: &SessionId) -> Result<bool, CacheError> {
        self.cache.exists(&self.session_key(id))
    }

    /// Update session data with a closure, using optimistic concurrency control.
    ///
    /// The stored version is re-read just before writing; if another writer
    /// bumped it in the meantime the update is retried, up to
    /// `MAX_UPDATE_RETRIES` times.
    ///
    /// # Returns
    /// - `Ok(T)` - The updated data after successful write
    /// - `Err(CacheError::ConcurrentModification)` - If all retries failed
    pub fn update<F>(&self, id: &SessionId, f: F) -> Result<T, CacheError>
    where
        F: Fn(&mut T),
    {
        for attempt in 0..MAX_UPDATE_RETRIES {
            let current = self.get_versioned(id)?;
            let expected_version = current.as_ref().map(|s| s.version).unwrap_or(0);
            let mut data = current
                .as_ref()
                .map(|s| s.data.clone())
                .unwrap_or_default();

            f(&mut data);

            let latest_version = self.get_versioned(id)?.map(|s| s.version).unwrap_or(0);
            if latest_version != expected_version {
                tracing::debug!(session = %id, attempt, "session changed during update, retrying");
                continue;
            }

            self.write(id, &data, current.as_ref())?;
            return Ok(data);
        }

        Err(CacheError::ConcurrentModification(format!(
            "{} after {} attempts",
            self.session_key(id),
            MAX_UPDATE_RETRIES
        )))
    }

    fn write(
        &self,
        id: &SessionId,
        data: &T,
        previous: Option<&SessionData<T>>,
    ) -> Result<(), CacheError> {
        let now = unix_now();
        let session_data = SessionData {
            id: id.clone(),
            data: data.clone(),
            version: previous.map(|p| p.version + 1).unwrap_or(1),
            created_at: previous.map(|p| p.created_at).unwrap_or(now),
            last_accessed: now,
        };
        self.cache.set(&self.session_key(id), &session_data)
    }

    fn session_key(&self, id: &SessionId) -> String {
        crate::cache_key!(self.namespace.as_str(), id)
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
