//! A self-contained backend over the key/value cache.
//!
//! Stores products and orders as JSON rows in a [`Cache`], so it runs in
//! memory for tests or on disk for the CLI. Its payment gateway is a
//! sandbox that approves every session immediately: the redirect URL it
//! hands out is the success return route itself.

use async_trait::async_trait;
use chrono::Utc;
use fiesta_cache::{cache_key, Cache};

use crate::catalog::{Product, ProductDraft};
use crate::checkout::{
    CheckoutReturn, NewOrder, NewOrderLine, Order, OrderLine, OrderLineDraft, OrderScope,
    OrderStatus, OrderSummary, PaymentSession, PaymentSessionRequest,
};
use crate::ids::{OrderId, OrderLineId, PaymentSessionId, ProductId};
use crate::ports::{
    BackendError, BackendResult, CatalogQuery, OrderQuery, OrderStore, PaymentGateway,
    ProductAdmin,
};

const PRODUCT_PREFIX: &str = "product";
const ORDER_PREFIX: &str = "order";
const ORDER_LINES_PREFIX: &str = "order_lines";

/// Products, orders and a payment sandbox kept in a [`Cache`].
#[derive(Debug, Clone)]
pub struct LocalBackend {
    cache: Cache,
    atomic_writes: bool,
}

impl LocalBackend {
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            atomic_writes: true,
        }
    }

    /// A backend held entirely in memory.
    pub fn in_memory() -> Self {
        Self::new(Cache::memory())
    }

    /// Turn the single-call reservation write on or off.
    pub fn with_atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    /// Insert or replace a product row as-is.
    pub fn put_product(&self, product: &Product) -> BackendResult<()> {
        self.cache
            .set(&cache_key!(PRODUCT_PREFIX, product.id), product)?;
        Ok(())
    }

    fn load_product(&self, id: &ProductId) -> BackendResult<Option<Product>> {
        Ok(self.cache.get(&cache_key!(PRODUCT_PREFIX, id))?)
    }

    fn load_order(&self, id: &OrderId) -> BackendResult<Option<Order>> {
        Ok(self.cache.get(&cache_key!(ORDER_PREFIX, id))?)
    }

    fn load_lines(&self, id: &OrderId) -> BackendResult<Vec<OrderLine>> {
        Ok(self
            .cache
            .get(&cache_key!(ORDER_LINES_PREFIX, id))?
            .unwrap_or_default())
    }

    fn store_order(&self, order: &Order) -> BackendResult<()> {
        self.cache.set(&cache_key!(ORDER_PREFIX, order.id), order)?;
        Ok(())
    }

    fn append_lines(&self, lines: &[NewOrderLine]) -> BackendResult<Vec<OrderLine>> {
        let mut written = Vec::with_capacity(lines.len());
        for line in lines {
            let order_id = line.order_id.clone();
            if self.load_order(&order_id)?.is_none() {
                return Err(BackendError::NotFound(format!("order {order_id}")));
            }
            let mut existing = self.load_lines(&order_id)?;
            let stored = line.clone().into_line(OrderLineId::generate());
            existing.push(stored.clone());
            self.cache
                .set(&cache_key!(ORDER_LINES_PREFIX, order_id), &existing)?;
            written.push(stored);
        }
        Ok(written)
    }

    fn product_from_draft(id: ProductId, draft: &ProductDraft, previous: Option<&Product>) -> Product {
        Product {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            stock: draft.stock,
            image: draft.image.clone(),
            created_at: previous
                .and_then(|p| p.created_at)
                .or_else(|| Some(Utc::now())),
        }
    }
}

#[async_trait]
impl CatalogQuery for LocalBackend {
    async fn list_products(&self) -> BackendResult<Vec<Product>> {
        let mut products = Vec::new();
        for key in self.cache.keys_with_prefix(&format!("{PRODUCT_PREFIX}:"))? {
            if let Some(product) = self.cache.get::<Product>(&key)? {
                products.push(product);
            }
        }
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn get_product(&self, id: &ProductId) -> BackendResult<Option<Product>> {
        self.load_product(id)
    }
}

#[async_trait]
impl ProductAdmin for LocalBackend {
    async fn create_product(&self, draft: &ProductDraft) -> BackendResult<Product> {
        let product = Self::product_from_draft(ProductId::generate(), draft, None);
        self.put_product(&product)?;
        Ok(product)
    }

    async fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> BackendResult<Product> {
        let previous = self
            .load_product(id)?
            .ok_or_else(|| BackendError::NotFound(format!("product {id}")))?;
        let product = Self::product_from_draft(id.clone(), draft, Some(&previous));
        self.put_product(&product)?;
        Ok(product)
    }

    async fn delete_product(&self, id: &ProductId) -> BackendResult<()> {
        let key = cache_key!(PRODUCT_PREFIX, id);
        if !self.cache.exists(&key)? {
            return Err(BackendError::NotFound(format!("product {id}")));
        }
        self.cache.delete(&key)?;
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for LocalBackend {
    async fn create_session(&self, request: &PaymentSessionRequest) -> BackendResult<PaymentSession> {
        if request.items.is_empty() {
            return Err(BackendError::Rejected {
                status: 400,
                message: "items are required and must be a non-empty list".to_string(),
            });
        }

        let session_id = PaymentSessionId::new(format!("cs_local_{}", uuid::Uuid::new_v4().simple()));

        let pending = NewOrder::new(request.user_id.clone(), request.total(), OrderStatus::Pending)
            .into_order(OrderId::generate(), Utc::now());
        self.store_order(&pending)?;
        let lines: Vec<NewOrderLine> = request
            .items
            .iter()
            .map(|item| NewOrderLine {
                order_id: pending.id.clone(),
                product_id: item.id.clone(),
                product_name: item.name.clone(),
                price: item.price,
                quantity: item.quantity,
            })
            .collect();
        self.append_lines(&lines)?;

        let url = CheckoutReturn::success_url(&request.return_url)
            .replace("{CHECKOUT_SESSION_ID}", session_id.as_str());
        tracing::debug!(session = %session_id, order = %pending.id, "sandbox payment session created");

        Ok(PaymentSession {
            url: Some(url),
            session_id: Some(session_id),
            order_id: Some(pending.id),
            error: None,
        })
    }
}

#[async_trait]
impl OrderStore for LocalBackend {
    async fn create_order(&self, order: &NewOrder) -> BackendResult<Order> {
        let order = order.clone().into_order(OrderId::generate(), Utc::now());
        self.store_order(&order)?;
        Ok(order)
    }

    async fn create_order_lines(&self, lines: &[NewOrderLine]) -> BackendResult<Vec<OrderLine>> {
        self.append_lines(lines)
    }

    fn supports_atomic_writes(&self) -> bool {
        self.atomic_writes
    }

    /// Lines are stored first and the order row last; listings only see
    /// orders through their row, so a half-written reservation is never
    /// visible.
    async fn create_reservation(
        &self,
        order: &NewOrder,
        lines: &[OrderLineDraft],
    ) -> BackendResult<OrderSummary> {
        if !self.atomic_writes {
            return Err(BackendError::Unsupported("atomic reservation write"));
        }

        let order = order.clone().into_order(OrderId::generate(), Utc::now());
        let lines: Vec<OrderLine> = lines
            .iter()
            .map(|draft| NewOrderLine::new(order.id.clone(), draft).into_line(OrderLineId::generate()))
            .collect();
        self.cache
            .set(&cache_key!(ORDER_LINES_PREFIX, order.id), &lines)?;
        self.store_order(&order)?;

        Ok(OrderSummary { order, lines })
    }

    async fn delete_order(&self, id: &OrderId) -> BackendResult<()> {
        self.cache.delete(&cache_key!(ORDER_PREFIX, id))?;
        self.cache.delete(&cache_key!(ORDER_LINES_PREFIX, id))?;
        Ok(())
    }

    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> BackendResult<Order> {
        let mut order = self
            .load_order(id)?
            .ok_or_else(|| BackendError::NotFound(format!("order {id}")))?;
        order.status = status;
        order.updated_at = Utc::now();
        self.store_order(&order)?;
        Ok(order)
    }
}

#[async_trait]
impl OrderQuery for LocalBackend {
    async fn list_orders(&self, scope: &OrderScope) -> BackendResult<Vec<OrderSummary>> {
        let mut summaries = Vec::new();
        for key in self.cache.keys_with_prefix(&format!("{ORDER_PREFIX}:"))? {
            let Some(order) = self.cache.get::<Order>(&key)? else {
                continue;
            };
            if scope.includes(&order) {
                let lines = self.load_lines(&order.id)?;
                summaries.push(OrderSummary { order, lines });
            }
        }
        summaries.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(summaries)
    }

    async fn get_order(&self, id: &OrderId) -> BackendResult<Option<OrderSummary>> {
        match self.load_order(id)? {
            Some(order) => {
                let lines = self.load_lines(id)?;
                Ok(Some(OrderSummary { order, lines }))
            }
            None => Ok(None),
        }
    }
}
