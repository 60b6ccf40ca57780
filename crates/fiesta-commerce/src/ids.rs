//! Newtype IDs for type-safe identifiers.
//!
//! Keeps a `ProductId` from being passed where an `OrderId` is expected,
//! even though both travel over the wire as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a new random (v4 UUID) ID.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// A sellable product.
    ProductId
);
define_id!(
    /// A persisted order row.
    OrderId
);
define_id!(
    /// A persisted order-line row.
    OrderLineId
);
define_id!(
    /// An authenticated user, as issued by the identity provider.
    UserId
);
define_id!(
    /// A hosted-payment session, as issued by the payment provider.
    PaymentSessionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = ProductId::new("prod-123");
        assert_eq!(id.as_str(), "prod-123");
    }

    #[test]
    fn test_id_generation_is_uuid() {
        let id1 = OrderId::generate();
        let id2 = OrderId::generate();
        assert_ne!(id1, id2);
        assert!(uuid::Uuid::parse_str(id1.as_str()).is_ok());
    }

    #[test]
    fn test_id_from_string() {
        let id: UserId = "user-456".into();
        assert_eq!(id.as_str(), "user-456");
        assert_eq!(id.to_string(), "user-456");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ProductId::new("tent-xl");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""tent-xl""#);
    }
}
