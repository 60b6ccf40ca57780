//! Catalog, checkout and order administration over the local backend.

mod support;

use std::sync::Arc;

use fiesta_commerce::checkout::{CheckoutConfig, CheckoutReturn, CheckoutStep, OrderStatus};
use fiesta_commerce::prelude::*;
use rust_decimal_macros::dec;
use support::{contact, FakeIdentity};

struct Store {
    backend: Arc<LocalBackend>,
    identity: Arc<FakeIdentity>,
    catalog: CatalogService,
    orders: OrderService,
}

impl Store {
    fn new(identity: FakeIdentity) -> Self {
        let backend = Arc::new(LocalBackend::in_memory());
        let identity = Arc::new(identity);
        Self {
            catalog: CatalogService::new(backend.clone(), backend.clone(), identity.clone()),
            orders: OrderService::new(backend.clone(), backend.clone(), identity.clone()),
            backend,
            identity,
        }
    }

    fn checkout(&self, cart: Arc<CartStore>) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(
            cart,
            self.identity.clone(),
            self.backend.clone(),
            self.backend.clone(),
            CheckoutConfig::default(),
        )
    }
}

fn draft(name: &str, price: rust_decimal::Decimal) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        description: format!("{name} for rent"),
        price,
        stock: 20,
        image: None,
    }
}

#[tokio::test]
async fn shopper_cannot_manage_products() {
    let store = Store::new(FakeIdentity::signed_in("shopper"));

    let err = store
        .catalog
        .create_product(&draft("Chair", dec!(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, CommerceError::NotPrivileged));
    assert!(store.catalog.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_visitor_cannot_manage_products() {
    let store = Store::new(FakeIdentity::default());

    let err = store
        .catalog
        .delete_product(&ProductId::new("p1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CommerceError::NotAuthenticated));
}

#[tokio::test]
async fn invalid_draft_is_rejected_before_privilege_check() {
    let store = Store::new(FakeIdentity::default());

    let err = store
        .catalog
        .create_product(&draft("  ", dec!(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, CommerceError::ValidationError(_)));
}

#[tokio::test]
async fn admin_manages_the_catalog() {
    let store = Store::new(FakeIdentity::admin("admin"));

    let tent = store.catalog.create_product(&draft("Tent", dec!(120))).await.unwrap();
    store.catalog.create_product(&draft("Balloons", dec!(3.5))).await.unwrap();

    let names: Vec<_> = store
        .catalog
        .list_products()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Balloons", "Tent"]);

    let updated = store
        .catalog
        .update_product(&tent.id, &draft("Tent", dec!(99)))
        .await
        .unwrap();
    assert_eq!(updated.price, dec!(99));
    assert_eq!(updated.image_or_placeholder(), fiesta_commerce::catalog::PLACEHOLDER_IMAGE);

    store.catalog.delete_product(&tent.id).await.unwrap();
    assert!(matches!(
        store.catalog.get_product(&tent.id).await,
        Err(CommerceError::ProductNotFound(_))
    ));
}

#[tokio::test]
async fn reservation_shows_up_in_order_history() {
    let store = Store::new(FakeIdentity::admin("u1"));
    let chair = store.catalog.create_product(&draft("Chair", dec!(10))).await.unwrap();
    let cloth = store.catalog.create_product(&draft("Cloth", dec!(5))).await.unwrap();

    let cart = Arc::new(CartStore::in_memory());
    cart.add_item(chair.snapshot(), 2).unwrap();
    cart.add_item(cloth.snapshot(), 1).unwrap();

    let checkout = store.checkout(cart.clone());
    checkout.begin().await.unwrap();
    checkout.choose_reserve().unwrap();
    let summary = checkout.submit_reservation(contact()).await.unwrap();

    let mine = store.orders.list_my_orders().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].order.id, summary.order.id);
    assert_eq!(mine[0].order.total_amount, dec!(25));
    assert_eq!(mine[0].order.status, OrderStatus::Reserved);
    assert_eq!(mine[0].item_count(), 3);
    assert!(mine[0].is_consistent());
    assert!(cart.is_empty());
}

#[tokio::test]
async fn sandbox_payment_round_trip_clears_cart() {
    let store = Store::new(FakeIdentity::admin("u1"));
    let tent = store.catalog.create_product(&draft("Tent", dec!(120))).await.unwrap();

    let cart = Arc::new(CartStore::in_memory());
    cart.add_item(tent.snapshot(), 1).unwrap();
    let checkout = store.checkout(cart.clone());
    checkout.begin().await.unwrap();

    let redirect = checkout.choose_pay_now().await.unwrap();
    assert!(!cart.is_empty());

    assert!(checkout.handle_return(&CheckoutReturn::parse(&redirect.url)).unwrap());
    assert!(cart.is_empty());
    assert_eq!(checkout.step(), CheckoutStep::Success);

    let pending = store.orders.list_all_orders().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].order.status, OrderStatus::Pending);
    assert_eq!(Some(pending[0].order.id.clone()), redirect.order_id);
}

#[tokio::test]
async fn pending_payment_order_belongs_to_the_shopper() {
    let store = Store::new(FakeIdentity::admin("admin"));
    let tent = store.catalog.create_product(&draft("Tent", dec!(120))).await.unwrap();
    *store.identity.user.lock().unwrap() = Some(UserId::new("u1"));

    let cart = Arc::new(CartStore::in_memory());
    cart.add_item(tent.snapshot(), 2).unwrap();
    let checkout = store.checkout(cart);
    checkout.begin().await.unwrap();

    let redirect = checkout.choose_pay_now().await.unwrap();

    let mine = store.orders.list_my_orders().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(Some(mine[0].order.id.clone()), redirect.order_id);
    assert_eq!(mine[0].order.status, OrderStatus::Pending);
    assert_eq!(mine[0].order.user_id, Some(UserId::new("u1")));
    assert_eq!(mine[0].order.total_amount, dec!(240));
}

#[tokio::test]
async fn admin_moves_order_through_statuses() {
    let store = Store::new(FakeIdentity::admin("admin"));
    let chair = store.catalog.create_product(&draft("Chair", dec!(10))).await.unwrap();
    let cart = Arc::new(CartStore::in_memory());
    cart.add_item(chair.snapshot(), 4).unwrap();
    let checkout = store.checkout(cart);
    checkout.begin().await.unwrap();
    checkout.choose_reserve().unwrap();
    let order_id = checkout.submit_reservation(contact()).await.unwrap().order.id;

    let done = store
        .orders
        .set_status(&order_id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(done.status, OrderStatus::Completed);

    let cancelled = store
        .orders
        .set_status(&order_id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let revived = store
        .orders
        .set_status(&order_id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(revived.status, OrderStatus::Completed);

    let listed = store.orders.list_all_orders().await.unwrap();
    assert_eq!(listed[0].order.status, OrderStatus::Completed);
}

#[tokio::test]
async fn shopper_cannot_list_all_orders_or_change_status() {
    let store = Store::new(FakeIdentity::signed_in("shopper"));

    assert!(matches!(
        store.orders.list_all_orders().await,
        Err(CommerceError::NotPrivileged)
    ));
    assert!(matches!(
        store
            .orders
            .set_status(&OrderId::new("o1"), OrderStatus::Completed)
            .await,
        Err(CommerceError::NotPrivileged)
    ));
}

#[tokio::test]
async fn unknown_order_status_change_is_not_found() {
    let store = Store::new(FakeIdentity::admin("admin"));

    let err = store
        .orders
        .set_status(&OrderId::new("missing"), OrderStatus::Completed)
        .await
        .unwrap_err();

    assert!(matches!(err, CommerceError::OrderNotFound(_)));
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() {
    let store = Store::new(FakeIdentity::admin("u1"));
    let chair = store.catalog.create_product(&draft("Chair", dec!(10))).await.unwrap();

    let cart = Arc::new(CartStore::in_memory());
    cart.add_item(chair.snapshot(), 1).unwrap();
    let checkout = store.checkout(cart);
    checkout.begin().await.unwrap();
    checkout.choose_reserve().unwrap();
    checkout.submit_reservation(contact()).await.unwrap();

    *store.identity.user.lock().unwrap() = Some(UserId::new("u2"));
    assert!(store.orders.list_my_orders().await.unwrap().is_empty());
}
