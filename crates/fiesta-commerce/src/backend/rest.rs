//! Backend for a hosted REST data platform.
//!
//! Tables are reached through PostgREST-style endpoints under `/rest/v1`,
//! the optional atomic reservation write through `/rest/v1/rpc`, and the
//! payment session through the `create-payment` function.

use async_trait::async_trait;
use fiesta_data::{ClientRequestBuilder, FetchClient};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::catalog::{Product, ProductDraft};
use crate::checkout::{
    NewOrder, NewOrderLine, Order, OrderLine, OrderLineDraft, OrderScope, OrderStatus,
    OrderSummary, PaymentSession, PaymentSessionRequest,
};
use crate::ids::{OrderId, ProductId};
use crate::ports::{
    BackendError, BackendResult, CatalogQuery, OrderQuery, OrderStore, PaymentGateway,
    ProductAdmin,
};

const PRODUCTS: &str = "/rest/v1/products";
const ORDERS: &str = "/rest/v1/orders";
const ORDER_ITEMS: &str = "/rest/v1/order_items";
const RESERVATION_RPC: &str = "/rest/v1/rpc/create_reservation";
const PAYMENT_FUNCTION: &str = "/functions/v1/create-payment";
const ORDER_WITH_ITEMS: &str = "*,order_items(*)";

/// Talks to the hosted platform over HTTP.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: FetchClient,
    api_key: String,
    access_token: Option<String>,
    reservation_rpc: bool,
}

impl RestBackend {
    /// Create a backend for `base_url`, authenticating with the public `api_key`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            client: FetchClient::new()
                .with_base_url(base_url)
                .with_default_header("apikey", api_key.clone()),
            api_key,
            access_token: None,
            reservation_rpc: false,
        }
    }

    /// Act on behalf of a signed-in user.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Use the `create_reservation` procedure for single-call reservations.
    pub fn with_reservation_rpc(mut self, enabled: bool) -> Self {
        self.reservation_rpc = enabled;
        self
    }

    fn authorize(&self, request: ClientRequestBuilder) -> ClientRequestBuilder {
        request.bearer_auth(self.access_token.as_deref().unwrap_or(&self.api_key))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ClientRequestBuilder) -> BackendResult<T> {
        let response = self.authorize(request).send().await?.error_for_status()?;
        Ok(response.json()?)
    }

    async fn execute(&self, request: ClientRequestBuilder) -> BackendResult<()> {
        self.authorize(request).send().await?.error_for_status()?;
        Ok(())
    }

    /// Insert or update rows and read back the stored representation.
    async fn write_rows<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        request: ClientRequestBuilder,
        body: &B,
    ) -> BackendResult<Vec<T>> {
        let request = request
            .header("Prefer", "return=representation")
            .json(body)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        self.fetch(request).await
    }

    async fn write_row<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        request: ClientRequestBuilder,
        body: &B,
        what: &str,
    ) -> BackendResult<T> {
        self.write_rows(request, body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse(format!("no {what} row returned")))
    }
}

/// An order row with its embedded `order_items`.
fn summary_from_row(mut row: serde_json::Value) -> BackendResult<OrderSummary> {
    let items = row
        .as_object_mut()
        .and_then(|obj| obj.remove("order_items"))
        .unwrap_or(serde_json::Value::Array(Vec::new()));
    let order: Order = serde_json::from_value(row)
        .map_err(|e| BackendError::InvalidResponse(format!("order row: {e}")))?;
    let lines: Vec<OrderLine> = serde_json::from_value(items)
        .map_err(|e| BackendError::InvalidResponse(format!("order items: {e}")))?;
    Ok(OrderSummary { order, lines })
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl CatalogQuery for RestBackend {
    async fn list_products(&self) -> BackendResult<Vec<Product>> {
        self.fetch(
            self.client
                .get(PRODUCTS)
                .query("select", "*")
                .query("order", "name.asc"),
        )
        .await
    }

    async fn get_product(&self, id: &ProductId) -> BackendResult<Option<Product>> {
        let rows: Vec<Product> = self
            .fetch(self.client.get(PRODUCTS).query("select", "*").query("id", eq(id)))
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl ProductAdmin for RestBackend {
    async fn create_product(&self, draft: &ProductDraft) -> BackendResult<Product> {
        self.write_row(self.client.post(PRODUCTS), draft, "product").await
    }

    async fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> BackendResult<Product> {
        self.write_row(self.client.patch(PRODUCTS).query("id", eq(id)), draft, "product")
            .await
            .map_err(|e| match e {
                BackendError::InvalidResponse(_) => BackendError::NotFound(format!("product {id}")),
                other => other,
            })
    }

    async fn delete_product(&self, id: &ProductId) -> BackendResult<()> {
        self.execute(self.client.delete(PRODUCTS).query("id", eq(id)))
            .await
    }
}

#[async_trait]
impl PaymentGateway for RestBackend {
    async fn create_session(&self, request: &PaymentSessionRequest) -> BackendResult<PaymentSession> {
        let call = self
            .client
            .post(PAYMENT_FUNCTION)
            .json(request)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        self.fetch(call).await
    }
}

#[async_trait]
impl OrderStore for RestBackend {
    async fn create_order(&self, order: &NewOrder) -> BackendResult<Order> {
        self.write_row(self.client.post(ORDERS), order, "order").await
    }

    async fn create_order_lines(&self, lines: &[NewOrderLine]) -> BackendResult<Vec<OrderLine>> {
        self.write_rows(self.client.post(ORDER_ITEMS), lines).await
    }

    fn supports_atomic_writes(&self) -> bool {
        self.reservation_rpc
    }

    async fn create_reservation(
        &self,
        order: &NewOrder,
        lines: &[OrderLineDraft],
    ) -> BackendResult<OrderSummary> {
        if !self.reservation_rpc {
            return Err(BackendError::Unsupported("atomic reservation write"));
        }
        let body = serde_json::json!({ "order": order, "items": lines });
        let call = self
            .client
            .post(RESERVATION_RPC)
            .json(&body)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        let row: serde_json::Value = self.fetch(call).await?;
        summary_from_row(row)
    }

    async fn delete_order(&self, id: &OrderId) -> BackendResult<()> {
        self.execute(self.client.delete(ORDER_ITEMS).query("order_id", eq(id)))
            .await?;
        self.execute(self.client.delete(ORDERS).query("id", eq(id)))
            .await
    }

    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> BackendResult<Order> {
        let body = serde_json::json!({ "status": status });
        self.write_row(self.client.patch(ORDERS).query("id", eq(id)), &body, "order")
            .await
    }
}

#[async_trait]
impl OrderQuery for RestBackend {
    async fn list_orders(&self, scope: &OrderScope) -> BackendResult<Vec<OrderSummary>> {
        let mut request = self
            .client
            .get(ORDERS)
            .query("select", ORDER_WITH_ITEMS)
            .query("order", "created_at.desc");
        if let OrderScope::Own(user) = scope {
            request = request.query("user_id", eq(user));
        }
        let rows: Vec<serde_json::Value> = self.fetch(request).await?;
        rows.into_iter().map(summary_from_row).collect()
    }

    async fn get_order(&self, id: &OrderId) -> BackendResult<Option<OrderSummary>> {
        let rows: Vec<serde_json::Value> = self
            .fetch(
                self.client
                    .get(ORDERS)
                    .query("select", ORDER_WITH_ITEMS)
                    .query("id", eq(id)),
            )
            .await?;
        rows.into_iter().next().map(summary_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_summary_from_embedded_row() {
        let row = serde_json::json!({
            "id": "o1",
            "user_id": "u1",
            "total_amount": 25,
            "status": "reserved",
            "created_at": "2024-05-01T12:00:00+00:00",
            "updated_at": "2024-05-01T12:00:00+00:00",
            "order_items": [
                {"id": "l1", "order_id": "o1", "product_id": "A", "product_name": "A", "price": 10, "quantity": 2},
                {"id": "l2", "order_id": "o1", "product_id": "B", "product_name": "B", "price": 5, "quantity": 1}
            ]
        });

        let summary = summary_from_row(row).unwrap();
        assert_eq!(summary.order.total_amount, dec!(25));
        assert_eq!(summary.lines.len(), 2);
        assert!(summary.is_consistent());
    }

    #[test]
    fn test_summary_without_items() {
        let row = serde_json::json!({
            "id": "o2",
            "user_id": null,
            "total_amount": 0,
            "status": "pending",
            "created_at": "2024-05-01T12:00:00+00:00",
            "updated_at": "2024-05-01T12:00:00+00:00"
        });
        let summary = summary_from_row(row).unwrap();
        assert!(summary.lines.is_empty());
        assert_eq!(summary.order.user_id, None);
    }

    #[test]
    fn test_bad_row_is_invalid_response() {
        let row = serde_json::json!({"id": "o3"});
        assert!(matches!(
            summary_from_row(row),
            Err(BackendError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_requests_carry_api_key() {
        let backend = RestBackend::new("https://db.test", "anon-key").with_access_token("jwt");
        let request = backend.authorize(backend.client.get(PRODUCTS));

        assert_eq!(request.request().header_value("apikey"), Some("anon-key"));
        assert_eq!(request.request().header_value("Authorization"), Some("Bearer jwt"));
        assert_eq!(request.request().url(), "https://db.test/rest/v1/products");
    }
}
