//! Checkout settings.

use serde::{Deserialize, Serialize};

use crate::money::Currency;

/// Default page the payment provider sends shoppers back to.
pub const DEFAULT_RETURN_URL: &str = "http://localhost:8080/checkout-success";

/// What to do with an order row whose lines failed to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialWritePolicy {
    /// Delete the order row.
    #[default]
    Compensate,
    /// Keep the row for inspection, with status `cancelled`.
    MarkCancelled,
}

/// Settings the checkout orchestrator runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Return route handed to the payment provider.
    pub return_url: String,
    /// Let anonymous visitors check out without signing in.
    pub allow_guest_checkout: bool,
    /// Cleanup for a non-atomic reservation write that fails halfway.
    pub partial_write_policy: PartialWritePolicy,
    /// Currency used when displaying totals.
    pub currency: Currency,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            return_url: DEFAULT_RETURN_URL.to_string(),
            allow_guest_checkout: false,
            partial_write_policy: PartialWritePolicy::Compensate,
            currency: Currency::USD,
        }
    }
}

impl CheckoutConfig {
    pub fn with_return_url(mut self, return_url: impl Into<String>) -> Self {
        self.return_url = return_url.into();
        self
    }

    pub fn with_guest_checkout(mut self, allow: bool) -> Self {
        self.allow_guest_checkout = allow;
        self
    }

    pub fn with_partial_write_policy(mut self, policy: PartialWritePolicy) -> Self {
        self.partial_write_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_checkout_off_by_default() {
        assert!(!CheckoutConfig::default().allow_guest_checkout);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: CheckoutConfig =
            serde_json::from_str(r#"{"partial_write_policy": "mark_cancelled"}"#).unwrap();

        assert_eq!(config.partial_write_policy, PartialWritePolicy::MarkCancelled);
        assert_eq!(config.return_url, DEFAULT_RETURN_URL);
        assert_eq!(config.currency, Currency::USD);
    }
}
