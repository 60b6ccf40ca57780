//! The persisted, observable cart for one browsing session.

use fiesta_cache::{Cache, Session, SessionId};
use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::cart::{Cart, LineItem};
use crate::catalog::ProductSnapshot;
use crate::ids::ProductId;
use crate::CommerceError;

/// Cache namespace for cart snapshots (`cart:<session id>`).
pub const CART_NAMESPACE: &str = "cart";

/// Where committed snapshots are written.
struct Persistence {
    sessions: Session<Cart>,
    session_id: SessionId,
}

/// A cart shared between the storefront views and the checkout orchestrator.
///
/// Every mutation is written to the backing cache before the in-memory
/// snapshot changes and before the call returns, so a reload always sees
/// what the last successful call left behind. Subscribers are notified of
/// each committed change.
pub struct CartStore {
    state: watch::Sender<Cart>,
    persistence: Option<Persistence>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.state.borrow().len())
            .field(
                "session",
                &self.persistence.as_ref().map(|p| p.session_id.as_str()),
            )
            .finish()
    }
}

impl CartStore {
    /// A cart that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            state: watch::Sender::new(Cart::new()),
            persistence: None,
        }
    }

    /// Open the cart for `session_id`, restoring any saved snapshot.
    ///
    /// A session seen for the first time starts with an empty cart.
    pub fn open(cache: Cache, session_id: SessionId) -> Result<Self, CommerceError> {
        let sessions = Session::<Cart>::new(cache, CART_NAMESPACE);
        let cart = sessions.get_or_create(&session_id)?;
        tracing::debug!(session = %session_id, items = cart.len(), "cart restored");

        Ok(Self {
            state: watch::Sender::new(cart),
            persistence: Some(Persistence {
                sessions,
                session_id,
            }),
        })
    }

    /// Add `quantity` units of a product, merging with an existing line.
    pub fn add_item(&self, product: ProductSnapshot, quantity: u32) -> Result<(), CommerceError> {
        let id = product.id.clone();
        if self.commit(|cart| cart.add_item(product, quantity))? {
            tracing::debug!(product = %id, quantity, "added to cart");
        }
        Ok(())
    }

    /// Remove a product's line. Absent products are ignored.
    pub fn remove_item(&self, product_id: &ProductId) -> Result<(), CommerceError> {
        self.commit(|cart| cart.remove_item(product_id))?;
        Ok(())
    }

    /// Set a line's quantity; zero or below removes it.
    pub fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<(), CommerceError> {
        self.commit(|cart| cart.update_quantity(product_id, quantity))?;
        Ok(())
    }

    /// Empty the cart.
    pub fn clear(&self) -> Result<(), CommerceError> {
        if self.commit(Cart::clear)? {
            tracing::debug!("cart cleared");
        }
        Ok(())
    }

    /// Remove what was just ordered, keeping anything added since.
    pub fn remove_ordered(&self, ordered: &[LineItem]) -> Result<(), CommerceError> {
        if self.commit(|cart| cart.remove_ordered(ordered))? {
            tracing::debug!(lines = ordered.len(), "ordered lines removed from cart");
        }
        Ok(())
    }

    /// A copy of the current cart.
    pub fn snapshot(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Line items in insertion order.
    pub fn items(&self) -> Vec<LineItem> {
        self.state.borrow().items().to_vec()
    }

    pub fn total_item_count(&self) -> u64 {
        self.state.borrow().total_item_count()
    }

    pub fn total_price(&self) -> Decimal {
        self.state.borrow().total_price()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Observe committed cart snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// Apply `mutate` to a copy of the cart, persist it, then publish it.
    ///
    /// Runs under the channel's write lock, so concurrent mutations are
    /// serialized. A failed write leaves both the stored and the in-memory
    /// cart as they were.
    fn commit<F>(&self, mutate: F) -> Result<bool, CommerceError>
    where
        F: FnOnce(&mut Cart) -> bool,
    {
        let mut outcome = Ok(false);
        self.state.send_if_modified(|current| {
            let mut next = current.clone();
            if !mutate(&mut next) {
                return false;
            }
            if let Some(p) = &self.persistence {
                if let Err(e) = p.sessions.set(&p.session_id, &next) {
                    tracing::error!(session = %p.session_id, error = %e, "failed to persist cart");
                    outcome = Err(e.into());
                    return false;
                }
            }
            *current = next;
            outcome = Ok(true);
            true
        });
        outcome
    }
}
