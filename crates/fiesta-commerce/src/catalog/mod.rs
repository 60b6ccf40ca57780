//! Product catalog module.
//!
//! Contains product types, the draft used by administrators, and the
//! service that fronts the catalog collaborators.

mod product;
mod service;

pub use product::{Product, ProductDraft, ProductSnapshot, PLACEHOLDER_IMAGE};
pub use service::CatalogService;
