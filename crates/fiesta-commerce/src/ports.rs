//! Contracts for the external collaborators the storefront talks to.
//!
//! Product and order persistence, identity and hosted payments are all owned
//! by remote services. The domain only sees these traits; backends in
//! [`crate::backend`] implement them, and tests substitute fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{Product, ProductDraft};
use crate::checkout::{
    NewOrder, NewOrderLine, Order, OrderLine, OrderLineDraft, OrderScope, OrderStatus,
    OrderSummary, PaymentSession, PaymentSessionRequest,
};
use crate::ids::{OrderId, ProductId, UserId};
use crate::CommerceError;

/// Result type for collaborator calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// A failed call to an external collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with an error status.
    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service answered, but not with the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller's credentials were missing or refused.
    #[error("unauthorized")]
    Unauthorized,

    /// The backend does not implement this capability.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Local storage behind the backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl BackendError {
    /// Whether repeating the same call later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport(_) | BackendError::Storage(_) => true,
            BackendError::Rejected { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<fiesta_cache::CacheError> for BackendError {
    fn from(e: fiesta_cache::CacheError) -> Self {
        BackendError::Storage(e.to_string())
    }
}

#[cfg(feature = "remote")]
impl From<fiesta_data::FetchError> for BackendError {
    fn from(e: fiesta_data::FetchError) -> Self {
        use fiesta_data::FetchError;
        match e {
            FetchError::HttpError { status: 401, .. } | FetchError::HttpError { status: 403, .. } => {
                BackendError::Unauthorized
            }
            FetchError::HttpError { status, message } => BackendError::Rejected { status, message },
            FetchError::ParseError(msg) | FetchError::JsonError(msg) => {
                BackendError::InvalidResponse(msg)
            }
            other => BackendError::Transport(other.to_string()),
        }
    }
}

/// Read access to sellable products.
#[async_trait]
pub trait CatalogQuery: Send + Sync {
    /// All products, ordered by name ascending.
    async fn list_products(&self) -> BackendResult<Vec<Product>>;

    /// A single product, if it exists.
    async fn get_product(&self, id: &ProductId) -> BackendResult<Option<Product>>;
}

/// Write access to the product catalog. Callers check privilege first.
#[async_trait]
pub trait ProductAdmin: Send + Sync {
    async fn create_product(&self, draft: &ProductDraft) -> BackendResult<Product>;

    async fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> BackendResult<Product>;

    async fn delete_product(&self, id: &ProductId) -> BackendResult<()>;
}

/// Who is signed in, and whether they administer the store.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` for an anonymous visitor.
    async fn current_user(&self) -> BackendResult<Option<UserId>>;

    /// Whether `user` holds administrator privilege.
    async fn is_privileged(&self, user: &UserId) -> BackendResult<bool>;

    /// End the current session.
    async fn sign_out(&self) -> BackendResult<()>;
}

/// Creates hosted-payment sessions.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Request a hosted-payment session for the given items.
    ///
    /// A response without a redirect URL is a failure even when the call
    /// itself succeeded; see [`PaymentSession::into_redirect`].
    async fn create_session(&self, request: &PaymentSessionRequest) -> BackendResult<PaymentSession>;
}

/// Writes order and order-line rows.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order row and return it with its generated identifier.
    async fn create_order(&self, order: &NewOrder) -> BackendResult<Order>;

    /// Insert the lines of an existing order.
    async fn create_order_lines(&self, lines: &[NewOrderLine]) -> BackendResult<Vec<OrderLine>>;

    /// Whether [`create_reservation`](Self::create_reservation) writes the
    /// order and its lines as one visible unit.
    fn supports_atomic_writes(&self) -> bool {
        false
    }

    /// Insert an order and all of its lines in one atomic write.
    async fn create_reservation(
        &self,
        _order: &NewOrder,
        _lines: &[OrderLineDraft],
    ) -> BackendResult<OrderSummary> {
        Err(BackendError::Unsupported("atomic reservation write"))
    }

    /// Remove an order row and any lines it has.
    async fn delete_order(&self, id: &OrderId) -> BackendResult<()>;

    /// Overwrite an order's status.
    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> BackendResult<Order>;
}

/// Read access to past orders.
#[async_trait]
pub trait OrderQuery: Send + Sync {
    /// Orders in `scope`, newest first, each with its lines.
    async fn list_orders(&self, scope: &OrderScope) -> BackendResult<Vec<OrderSummary>>;

    /// A single order with its lines.
    async fn get_order(&self, id: &OrderId) -> BackendResult<Option<OrderSummary>>;
}

/// Resolve the signed-in user and require administrator privilege.
pub(crate) async fn require_admin(
    identity: &dyn IdentityProvider,
) -> Result<UserId, CommerceError> {
    let user = identity
        .current_user()
        .await?
        .ok_or(CommerceError::NotAuthenticated)?;
    if !identity.is_privileged(&user).await? {
        tracing::warn!(user = %user, "administrator privilege required");
        return Err(CommerceError::NotPrivileged);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(BackendError::Transport("reset".into()).is_retryable());
        assert!(BackendError::Rejected {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(!BackendError::Rejected {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!BackendError::Unauthorized.is_retryable());
    }
}
