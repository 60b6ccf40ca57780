//! Collaborator implementations.
//!
//! [`LocalBackend`] keeps everything in a [`fiesta_cache::Cache`] and serves
//! the CLI and the tests. With the `remote` feature, [`RestBackend`] talks to
//! the hosted data platform.

mod local;
#[cfg(feature = "remote")]
mod rest;

pub use local::LocalBackend;
#[cfg(feature = "remote")]
pub use rest::RestBackend;
