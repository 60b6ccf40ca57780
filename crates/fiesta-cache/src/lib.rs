//! Type-safe Key-Value persistence layer for the Fiesta storefront.
//!
//! Provides a small, ergonomic API for keeping JSON-serialized values in a
//! key/value store. Two stores ship with the crate: an in-process map used by
//! tests and short-lived sessions, and a directory-backed store whose contents
//! survive a restart (the equivalent of browser storage surviving a reload).
//!
//! # Example
//!
//! ```rust
//! use fiesta_cache::Cache;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Cart {
//!     items: Vec<String>,
//! }
//!
//! let cache = Cache::memory();
//! let cart = Cart { items: vec!["balloon-arch".into()] };
//!
//! cache.set("cart:sess_123", &cart).unwrap();
//! let restored: Option<Cart> = cache.get("cart:sess_123").unwrap();
//! assert_eq!(restored, Some(cart));
//!
//! cache.delete("cart:sess_123").unwrap();
//! ```

mod error;
mod kv;
mod session;
mod store;

pub use error::CacheError;
pub use kv::Cache;
pub use session::{Session, SessionData, SessionId};
pub use store::{FileStore, KvStore, MemoryStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, KvStore, Session, SessionId};
}
