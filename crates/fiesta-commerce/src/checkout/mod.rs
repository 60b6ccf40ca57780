//! Checkout module.
//!
//! Contains the checkout state machine and its orchestrator, the payloads
//! exchanged with the payment and order collaborators, and order types.

mod config;
mod error;
mod flow;
mod orchestrator;
mod order;
mod payment;
mod reservation;

pub use config::{CheckoutConfig, PartialWritePolicy, DEFAULT_RETURN_URL};
pub use error::{CheckoutError, PartialWriteOutcome};
pub use flow::{CheckoutEvent, CheckoutFlow, CheckoutStep};
pub use orchestrator::CheckoutOrchestrator;
pub use order::{
    NewOrder, NewOrderLine, Order, OrderLine, OrderLineDraft, OrderScope, OrderStatus,
    OrderSummary,
};
pub use payment::{
    CheckoutReturn, HostedRedirect, PaymentItem, PaymentMethod, PaymentSession,
    PaymentSessionRequest,
};
pub use reservation::{ReservationField, ReservationRequest};
