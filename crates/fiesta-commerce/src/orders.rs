//! Order history for shoppers and order administration.

use std::sync::Arc;

use crate::checkout::{Order, OrderScope, OrderStatus, OrderSummary};
use crate::ids::OrderId;
use crate::ports::{require_admin, IdentityProvider, OrderQuery, OrderStore};
use crate::CommerceError;

/// Lists orders and lets administrators change their status.
pub struct OrderService {
    query: Arc<dyn OrderQuery>,
    store: Arc<dyn OrderStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl OrderService {
    pub fn new(
        query: Arc<dyn OrderQuery>,
        store: Arc<dyn OrderStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            query,
            store,
            identity,
        }
    }

    /// The signed-in user's orders, newest first.
    #[tracing::instrument(skip_all)]
    pub async fn list_my_orders(&self) -> Result<Vec<OrderSummary>, CommerceError> {
        let user = self
            .identity
            .current_user()
            .await?
            .ok_or(CommerceError::NotAuthenticated)?;
        self.list(OrderScope::Own(user)).await
    }

    /// Every order in the store, newest first. Administrators only.
    #[tracing::instrument(skip_all)]
    pub async fn list_all_orders(&self) -> Result<Vec<OrderSummary>, CommerceError> {
        require_admin(self.identity.as_ref()).await?;
        self.list(OrderScope::All).await
    }

    /// Change an order's status. Administrators only.
    ///
    /// Any status may be set from any other, including completing an order
    /// that was cancelled.
    #[tracing::instrument(skip_all, fields(order = %id, status = %status))]
    pub async fn set_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, CommerceError> {
        let admin = require_admin(self.identity.as_ref()).await?;
        let current = self
            .query
            .get_order(id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(id.to_string()))?;

        let from = current.order.status;
        let order = self.store.update_order_status(id, status).await?;
        tracing::info!(admin = %admin, %from, "order status updated");
        Ok(order)
    }

    async fn list(&self, scope: OrderScope) -> Result<Vec<OrderSummary>, CommerceError> {
        let mut orders = self.query.list_orders(&scope).await?;
        orders.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));

        let inconsistent = orders.iter().filter(|o| !o.is_consistent()).count();
        if inconsistent > 0 {
            tracing::warn!(inconsistent, "orders whose lines do not add up to their total");
        }
        Ok(orders)
    }
}
