//! Checkout error types.

use thiserror::Error;

use crate::checkout::{CheckoutStep, ReservationField};
use crate::ids::OrderId;
use crate::ports::BackendError;
use crate::CommerceError;

/// What happened to an order whose lines could not be written.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialWriteOutcome {
    /// The order row was deleted.
    RolledBack,
    /// The order row was kept with status `cancelled`.
    MarkedCancelled,
    /// Cleanup was attempted and failed; the row may still be visible.
    CleanupFailed(String),
}

impl std::fmt::Display for PartialWriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartialWriteOutcome::RolledBack => write!(f, "order rolled back"),
            PartialWriteOutcome::MarkedCancelled => write!(f, "order marked cancelled"),
            PartialWriteOutcome::CleanupFailed(e) => write!(f, "cleanup failed: {e}"),
        }
    }
}

/// Errors surfaced by the checkout orchestrator.
///
/// Every collaborator failure is converted into one of these at the
/// orchestrator boundary; none of them leave the cart modified.
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Checkout was started with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Nobody is signed in and guest checkout is disabled.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Reservation fields are missing.
    #[error("Missing reservation fields: {}", join_fields(.missing))]
    ValidationFailed { missing: Vec<ReservationField> },

    /// The current user could not be resolved.
    #[error("Identity lookup failed: {0}")]
    IdentityUnavailable(#[source] BackendError),

    /// The payment provider did not produce a redirect.
    #[error("Payment session creation failed: {0}")]
    PaymentSessionFailed(String),

    /// The order row was not written.
    #[error("Order write failed: {0}")]
    OrderWriteFailed(#[source] BackendError),

    /// The order row was written but its lines were not.
    #[error("Order line write failed for order {order_id} ({cleanup}): {source}")]
    OrderLinesWriteFailed {
        order_id: OrderId,
        #[source]
        source: BackendError,
        cleanup: PartialWriteOutcome,
    },

    /// A submission is already running.
    #[error("A checkout submission is already in progress")]
    AlreadyInFlight,

    /// The requested action does not apply to the current step.
    #[error("Cannot {event} while checkout is {from}")]
    InvalidTransition {
        from: CheckoutStep,
        event: &'static str,
    },

    /// Reading or writing the cart failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CommerceError),
}

impl CheckoutError {
    /// Short message suitable for showing to the shopper.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::EmptyCart => "Your cart is empty.".to_string(),
            CheckoutError::NotAuthenticated => "Please sign in to check out.".to_string(),
            CheckoutError::ValidationFailed { missing } => {
                format!("Please fill in your {}.", join_fields(missing))
            }
            CheckoutError::PaymentSessionFailed(_) => {
                "We could not start the payment. Please try again.".to_string()
            }
            CheckoutError::OrderWriteFailed(_) | CheckoutError::OrderLinesWriteFailed { .. } => {
                "We could not record your reservation. Please try again.".to_string()
            }
            CheckoutError::AlreadyInFlight => "Your order is already being processed.".to_string(),
            CheckoutError::IdentityUnavailable(_)
            | CheckoutError::InvalidTransition { .. }
            | CheckoutError::Cart(_) => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Failed local checks; no external call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CheckoutError::EmptyCart | CheckoutError::ValidationFailed { .. }
        )
    }

    /// The shopper must sign in before retrying.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, CheckoutError::NotAuthenticated)
    }

    /// An external call failed; the same action may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::IdentityUnavailable(_)
                | CheckoutError::PaymentSessionFailed(_)
                | CheckoutError::OrderWriteFailed(_)
                | CheckoutError::OrderLinesWriteFailed { .. }
        )
    }
}

fn join_fields(fields: &[ReservationField]) -> String {
    fields
        .iter()
        .map(ReservationField::label)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_fields() {
        let err = CheckoutError::ValidationFailed {
            missing: vec![ReservationField::ContactName, ReservationField::ContactPhone],
        };
        assert!(err.is_validation());
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), "Please fill in your name, phone.");
        assert_eq!(err.to_string(), "Missing reservation fields: name, phone");
    }

    #[test]
    fn test_backend_failures_are_retryable() {
        let err = CheckoutError::OrderLinesWriteFailed {
            order_id: OrderId::new("o1"),
            source: BackendError::Transport("reset".into()),
            cleanup: PartialWriteOutcome::RolledBack,
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("order rolled back"));
        assert!(CheckoutError::PaymentSessionFailed("x".into()).is_retryable());
    }

    #[test]
    fn test_sign_in_is_not_validation() {
        let err = CheckoutError::NotAuthenticated;
        assert!(err.requires_sign_in());
        assert!(!err.is_validation());
    }
}
