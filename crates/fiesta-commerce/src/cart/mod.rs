//! Shopping cart module.
//!
//! [`Cart`] holds the pure line-item operations; [`CartStore`] wraps it with
//! per-session persistence and change notification.

#[allow(clippy::module_inception)]
mod cart;
mod store;

pub use cart::{Cart, LineItem};
pub use store::{CartStore, CART_NAMESPACE};
