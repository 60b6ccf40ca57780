//! Users, sessions and identity providers for the Fiesta storefront.
//!
//! [`SessionIdentity`] keeps users and the signed-in session in a
//! [`fiesta_cache::Cache`]. With the `remote` feature, [`RemoteIdentity`]
//! asks the hosted auth service instead. Both implement
//! [`fiesta_commerce::ports::IdentityProvider`], which is all the checkout
//! and admin services need.

mod error;
mod identity;
#[cfg(feature = "remote")]
mod remote;
mod session;
mod user;

pub use error::AuthError;
pub use identity::SessionIdentity;
#[cfg(feature = "remote")]
pub use remote::RemoteIdentity;
pub use session::AuthSession;
pub use user::{normalize_email, Role, User};
