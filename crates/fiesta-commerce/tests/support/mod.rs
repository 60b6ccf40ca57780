//! Recording fakes for the checkout collaborators.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use fiesta_commerce::checkout::{
    CheckoutConfig, CheckoutOrchestrator, NewOrder, NewOrderLine, Order, OrderLine,
    OrderLineDraft, OrderStatus, OrderSummary, PaymentSession, PaymentSessionRequest,
};
use fiesta_commerce::ports::{
    BackendError, BackendResult, IdentityProvider, OrderStore, PaymentGateway,
};
use fiesta_commerce::prelude::*;
use rust_decimal::Decimal;
use tokio::sync::Notify;

pub fn snapshot(id: &str, name: &str, price: Decimal) -> ProductSnapshot {
    ProductSnapshot {
        id: ProductId::new(id),
        name: name.to_string(),
        unit_price: price,
        image: format!("https://cdn.test/{id}.jpg"),
    }
}

pub fn contact() -> ReservationRequest {
    ReservationRequest::new("Ana Ruiz", "ana@example.com", "555-0100")
}

fn rejected() -> BackendError {
    BackendError::Rejected {
        status: 500,
        message: "boom".to_string(),
    }
}

/// Blocks a fake's next call until released, when armed.
#[derive(Default)]
pub struct Gate {
    armed: AtomicBool,
    release: Notify,
}

impl Gate {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn open(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    async fn pass(&self) {
        tokio::task::yield_now().await;
        if self.armed.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    pub user: Mutex<Option<UserId>>,
    pub admins: Mutex<Vec<UserId>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn signed_in(user: &str) -> Self {
        let identity = Self::default();
        *identity.user.lock().unwrap() = Some(UserId::new(user));
        identity
    }

    pub fn admin(user: &str) -> Self {
        let identity = Self::signed_in(user);
        identity.admins.lock().unwrap().push(UserId::new(user));
        identity
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn current_user(&self) -> BackendResult<Option<UserId>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("identity down".to_string()));
        }
        Ok(self.user.lock().unwrap().clone())
    }

    async fn is_privileged(&self, user: &UserId) -> BackendResult<bool> {
        Ok(self.admins.lock().unwrap().contains(user))
    }

    async fn sign_out(&self) -> BackendResult<()> {
        *self.user.lock().unwrap() = None;
        Ok(())
    }
}

pub struct FakePayments {
    pub response: Mutex<BackendResult<PaymentSession>>,
    pub requests: Mutex<Vec<PaymentSessionRequest>>,
    pub gate: Gate,
}

impl Default for FakePayments {
    fn default() -> Self {
        Self {
            response: Mutex::new(Ok(PaymentSession {
                url: Some("https://pay.test/cs_1".to_string()),
                session_id: Some(PaymentSessionId::new("cs_1")),
                order_id: None,
                error: None,
            })),
            requests: Mutex::new(Vec::new()),
            gate: Gate::default(),
        }
    }
}

impl FakePayments {
    pub fn responding(session: PaymentSession) -> Self {
        let payments = Self::default();
        *payments.response.lock().unwrap() = Ok(session);
        payments
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_session(&self, request: &PaymentSessionRequest) -> BackendResult<PaymentSession> {
        self.requests.lock().unwrap().push(request.clone());
        self.gate.pass().await;
        self.response.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct FakeOrders {
    pub orders: Mutex<Vec<NewOrder>>,
    pub line_batches: Mutex<Vec<Vec<NewOrderLine>>>,
    pub reservations: AtomicUsize,
    pub deleted: Mutex<Vec<OrderId>>,
    pub status_updates: Mutex<Vec<(OrderId, OrderStatus)>>,
    pub atomic: AtomicBool,
    pub fail_order: AtomicBool,
    pub fail_lines: AtomicBool,
    pub fail_cleanup: AtomicBool,
    pub gate: Gate,
    pub lines_gate: Gate,
}

impl FakeOrders {
    pub fn order_calls(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn line_calls(&self) -> usize {
        self.line_batches.lock().unwrap().len()
    }

    pub fn external_calls(&self) -> usize {
        self.order_calls() + self.line_calls() + self.reservations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for FakeOrders {
    async fn create_order(&self, order: &NewOrder) -> BackendResult<Order> {
        self.orders.lock().unwrap().push(order.clone());
        self.gate.pass().await;
        if self.fail_order.load(Ordering::SeqCst) {
            return Err(rejected());
        }
        Ok(order.clone().into_order(OrderId::new("order-1"), Utc::now()))
    }

    async fn create_order_lines(&self, lines: &[NewOrderLine]) -> BackendResult<Vec<OrderLine>> {
        self.line_batches.lock().unwrap().push(lines.to_vec());
        self.lines_gate.pass().await;
        if self.fail_lines.load(Ordering::SeqCst) {
            return Err(rejected());
        }
        Ok(lines
            .iter()
            .cloned()
            .map(|line| line.into_line(OrderLineId::generate()))
            .collect())
    }

    fn supports_atomic_writes(&self) -> bool {
        self.atomic.load(Ordering::SeqCst)
    }

    async fn create_reservation(
        &self,
        order: &NewOrder,
        lines: &[OrderLineDraft],
    ) -> BackendResult<OrderSummary> {
        self.reservations.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;
        if self.fail_order.load(Ordering::SeqCst) {
            return Err(rejected());
        }
        let id = OrderId::new("order-atomic");
        Ok(OrderSummary {
            order: order.clone().into_order(id.clone(), Utc::now()),
            lines: lines
                .iter()
                .map(|draft| NewOrderLine::new(id.clone(), draft).into_line(OrderLineId::generate()))
                .collect(),
        })
    }

    async fn delete_order(&self, id: &OrderId) -> BackendResult<()> {
        self.deleted.lock().unwrap().push(id.clone());
        if self.fail_cleanup.load(Ordering::SeqCst) {
            return Err(rejected());
        }
        Ok(())
    }

    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> BackendResult<Order> {
        self.status_updates.lock().unwrap().push((id.clone(), status));
        if self.fail_cleanup.load(Ordering::SeqCst) {
            return Err(rejected());
        }
        let order = NewOrder::new(None, Decimal::ZERO, status);
        Ok(order.into_order(id.clone(), Utc::now()))
    }
}

pub struct Harness {
    pub cart: Arc<CartStore>,
    pub identity: Arc<FakeIdentity>,
    pub payments: Arc<FakePayments>,
    pub orders: Arc<FakeOrders>,
    pub checkout: CheckoutOrchestrator,
}

impl Harness {
    pub fn new(identity: FakeIdentity) -> Self {
        Self::with(identity, FakePayments::default(), FakeOrders::default(), CheckoutConfig::default())
    }

    pub fn with(
        identity: FakeIdentity,
        payments: FakePayments,
        orders: FakeOrders,
        config: CheckoutConfig,
    ) -> Self {
        let cart = Arc::new(CartStore::in_memory());
        let identity = Arc::new(identity);
        let payments = Arc::new(payments);
        let orders = Arc::new(orders);
        let checkout = CheckoutOrchestrator::new(
            cart.clone(),
            identity.clone(),
            payments.clone(),
            orders.clone(),
            config,
        );
        Self {
            cart,
            identity,
            payments,
            orders,
            checkout,
        }
    }

    /// Two chairs at 10 and one table cloth at 5.
    pub fn fill_cart(&self) {
        self.cart
            .add_item(snapshot("A", "Folding chair", Decimal::from(10)), 2)
            .unwrap();
        self.cart
            .add_item(snapshot("B", "Table cloth", Decimal::from(5)), 1)
            .unwrap();
    }

    pub async fn at_reservation_form(&self) {
        self.fill_cart();
        self.checkout.begin().await.unwrap();
        self.checkout.choose_reserve().unwrap();
    }

    /// Let a write whose caller went away run to completion.
    pub async fn until_idle(&self) {
        while self.checkout.is_processing() {
            tokio::task::yield_now().await;
        }
    }
}
