//! Catalog, cart and checkout logic for the Fiesta party-rental storefront.
//!
//! - **Catalog**: rentable products and administrator product edits
//! - **Cart**: per-session cart with persistence and change notification
//! - **Checkout**: the pay-now / reserve state machine and its orchestrator
//! - **Orders**: order history and status administration
//!
//! External systems (identity, payments, order storage, the catalog) are
//! reached through the traits in [`ports`]; [`backend`] has implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use fiesta_commerce::prelude::*;
//!
//! let backend = Arc::new(LocalBackend::in_memory());
//! let cart = Arc::new(CartStore::in_memory());
//! cart.add_item(product.snapshot(), 2)?;
//!
//! let checkout = CheckoutOrchestrator::new(
//!     cart.clone(),
//!     identity,
//!     backend.clone(),
//!     backend.clone(),
//!     CheckoutConfig::default(),
//! );
//! checkout.begin().await?;
//! checkout.choose_reserve()?;
//! let summary = checkout
//!     .submit_reservation(ReservationRequest::new("Ana", "ana@example.com", "555-0100"))
//!     .await?;
//! println!("reserved order {}", summary.order.id);
//! ```

pub mod error;
pub mod ids;
pub mod money;
pub mod ports;

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use crate::ports::{
        BackendError, BackendResult, CatalogQuery, IdentityProvider, OrderQuery, OrderStore,
        PaymentGateway, ProductAdmin,
    };

    // Catalog
    pub use crate::catalog::{CatalogService, Product, ProductDraft, ProductSnapshot};

    // Cart
    pub use crate::cart::{Cart, CartStore, LineItem};

    // Checkout
    pub use crate::checkout::{
        CheckoutConfig, CheckoutError, CheckoutEvent, CheckoutFlow, CheckoutOrchestrator,
        CheckoutReturn, CheckoutStep, HostedRedirect, Order, OrderLine, OrderStatus,
        OrderSummary, PartialWritePolicy, ReservationRequest,
    };

    pub use crate::backend::LocalBackend;
    #[cfg(feature = "remote")]
    pub use crate::backend::RestBackend;
    pub use crate::orders::OrderService;
}
