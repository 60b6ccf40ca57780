//! Commerce error types.

use thiserror::Error;

use crate::ports::BackendError;

/// Errors from catalog, cart and order operations.
///
/// Checkout has its own richer error type, [`CheckoutError`](crate::checkout::CheckoutError),
/// because the view needs to tell validation, sign-in and backend failures apart.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// A product draft failed validation.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The caller must be signed in.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The caller is signed in but lacks administrator privilege.
    #[error("Administrator privilege required")]
    NotPrivileged,

    /// Unrecognized currency code.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Unrecognized order status.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    /// Cart persistence failed.
    #[error("Cache error: {0}")]
    CacheError(#[from] fiesta_cache::CacheError),

    /// An external collaborator failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
