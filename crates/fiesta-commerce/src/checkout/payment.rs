//! Hosted-payment session payloads and the return route.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, LineItem};
use crate::ids::{OrderId, PaymentSessionId, ProductId, UserId};
use crate::money;

/// How the shopper pays on the hosted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
}

/// One cart line as sent to the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentItem {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    pub image: String,
}

impl From<&LineItem> for PaymentItem {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.product_id.clone(),
            name: item.name.clone(),
            price: item.unit_price,
            quantity: item.quantity,
            image: item.image.clone(),
        }
    }
}

/// The create-payment-session request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    pub items: Vec<PaymentItem>,
    pub return_url: String,
    pub payment_method: PaymentMethod,
    /// The shopper paying, for gateways that record the order themselves.
    /// Not sent: a remote gateway identifies the user from the bearer token.
    #[serde(skip)]
    pub user_id: Option<UserId>,
}

impl PaymentSessionRequest {
    pub fn from_cart(cart: &Cart, return_url: impl Into<String>) -> Self {
        Self {
            items: cart.items().iter().map(PaymentItem::from).collect(),
            return_url: return_url.into(),
            payment_method: PaymentMethod::Card,
            user_id: None,
        }
    }

    pub fn for_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Sum of `price * quantity` over the items.
    pub fn total(&self) -> Decimal {
        money::sum_totals(self.items.iter().map(|i| money::line_total(i.price, i.quantity)))
    }
}

/// The create-payment-session response body.
///
/// Every field is optional on the wire; see [`into_redirect`](Self::into_redirect).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub session_id: Option<PaymentSessionId>,
    /// A `pending` order the provider side may have created up front.
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PaymentSession {
    /// The redirect to hand the browser, or the reason there is none.
    ///
    /// A missing or blank `url` is a failure even if the call returned 200.
    pub fn into_redirect(self) -> Result<HostedRedirect, String> {
        match self.url {
            Some(url) if !url.trim().is_empty() => Ok(HostedRedirect {
                url,
                session_id: self.session_id,
                order_id: self.order_id,
            }),
            _ => Err(self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "payment session response carried no redirect url".to_string())),
        }
    }
}

/// Where to send the browser to pay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostedRedirect {
    pub url: String,
    pub session_id: Option<PaymentSessionId>,
    pub order_id: Option<OrderId>,
}

/// Query parameters the payment provider appends to the return URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutReturn {
    pub success: bool,
    pub session_id: Option<PaymentSessionId>,
}

impl CheckoutReturn {
    /// Parse a return URL or a bare query string. Values are percent-decoded.
    ///
    /// ```
    /// use fiesta_commerce::checkout::CheckoutReturn;
    ///
    /// let ret = CheckoutReturn::parse("https://shop.test/checkout-success?session_id=cs_1&success=true");
    /// assert!(ret.should_clear_cart());
    /// assert!(!CheckoutReturn::parse("?success=false").should_clear_cart());
    /// ```
    pub fn parse(url_or_query: &str) -> Self {
        let query = match url_or_query.split_once('?') {
            Some((_, query)) => query,
            None => url_or_query,
        };
        let query = query.split('#').next().unwrap_or_default();

        let mut ret = CheckoutReturn::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "success" => ret.success = value == "true",
                "session_id" if !value.is_empty() => {
                    ret.session_id = Some(PaymentSessionId::new(value.into_owned()));
                }
                _ => {}
            }
        }
        ret
    }

    /// Only a successful return that names a session empties the cart.
    pub fn should_clear_cart(&self) -> bool {
        self.success && self.session_id.is_some()
    }

    /// The success URL template given to the provider.
    pub fn success_url(return_url: &str) -> String {
        format!("{return_url}?session_id={{CHECKOUT_SESSION_ID}}&success=true")
    }

    /// The cancel URL given to the provider.
    pub fn cancel_url(return_url: &str) -> String {
        format!("{return_url}?success=false")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductSnapshot;
    use rust_decimal_macros::dec;

    #[test]
    fn test_request_from_cart() {
        let mut cart = Cart::new();
        cart.add_item(
            ProductSnapshot {
                id: ProductId::new("A"),
                name: "Chair".to_string(),
                unit_price: dec!(10),
                image: "https://cdn.test/a.jpg".to_string(),
            },
            2,
        );

        let req = PaymentSessionRequest::from_cart(&cart, "https://shop.test/checkout-success")
            .for_user(Some(UserId::new("u1")));
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(req.total(), dec!(20));
        assert_eq!(json["returnUrl"], "https://shop.test/checkout-success");
        assert_eq!(json["paymentMethod"], "card");
        assert_eq!(json["items"][0]["price"], 10.0);
        assert_eq!(json["items"][0]["quantity"], 2);
        assert!(json.get("userId").is_none());
    }

    #[test]
    fn test_session_without_url_is_failure() {
        let session: PaymentSession = serde_json::from_str(r#"{"sessionId": "cs_1"}"#).unwrap();
        assert!(session.into_redirect().is_err());

        let session: PaymentSession = serde_json::from_str(r#"{"error": "Missing key"}"#).unwrap();
        assert_eq!(session.into_redirect().unwrap_err(), "Missing key");

        let session: PaymentSession = serde_json::from_str(r#"{"url": ""}"#).unwrap();
        assert!(session.into_redirect().is_err());
    }

    #[test]
    fn test_session_with_url() {
        let session: PaymentSession = serde_json::from_str(
            r#"{"url": "https://pay.test/c/cs_1", "sessionId": "cs_1", "orderId": "o-9"}"#,
        )
        .unwrap();
        let redirect = session.into_redirect().unwrap();

        assert_eq!(redirect.url, "https://pay.test/c/cs_1");
        assert_eq!(redirect.order_id, Some(OrderId::new("o-9")));
    }

    #[test]
    fn test_return_parsing() {
        let ret = CheckoutReturn::parse("session_id=cs_9&success=true");
        assert_eq!(ret.session_id, Some(PaymentSessionId::new("cs_9")));
        assert!(ret.should_clear_cart());

        assert!(!CheckoutReturn::parse("https://shop.test/x?success=true").should_clear_cart());
        assert!(!CheckoutReturn::parse("https://shop.test/x?session_id=cs_9&success=false")
            .should_clear_cart());
        assert!(!CheckoutReturn::parse("").should_clear_cart());
    }

    #[test]
    fn test_return_values_are_percent_decoded() {
        let ret = CheckoutReturn::parse("https://shop.test/done?session_id=cs%5Ftest+1&success=true#top");
        assert_eq!(ret.session_id, Some(PaymentSessionId::new("cs_test 1")));
        assert!(ret.success);

        let ret = CheckoutReturn::parse("?success=tru%65&session_id=");
        assert!(ret.success);
        assert!(!ret.should_clear_cart());
    }

    #[test]
    fn test_provider_urls() {
        assert_eq!(
            CheckoutReturn::success_url("https://shop.test/done"),
            "https://shop.test/done?session_id={CHECKOUT_SESSION_ID}&success=true"
        );
        assert_eq!(
            CheckoutReturn::cancel_url("https://shop.test/done"),
            "https://shop.test/done?success=false"
        );
    }
}
