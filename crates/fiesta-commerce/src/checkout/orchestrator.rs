//! The checkout orchestrator.
//!
//! Drives a [`CheckoutFlow`] through the identity check, the payment-method
//! choice and one of the two submission paths, calling out to the injected
//! collaborators and emptying the cart only after a confirmed success.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::Instrument;

use crate::cart::CartStore;
use crate::checkout::{
    CheckoutConfig, CheckoutError, CheckoutEvent, CheckoutFlow, CheckoutReturn, CheckoutStep,
    HostedRedirect, NewOrder, NewOrderLine, OrderLineDraft, OrderStatus, OrderSummary,
    PartialWriteOutcome, PartialWritePolicy, PaymentSessionRequest, ReservationRequest,
};
use crate::ids::{OrderId, UserId};
use crate::ports::{BackendError, IdentityProvider, OrderStore, PaymentGateway};

#[derive(Debug, Default)]
struct CheckoutState {
    flow: CheckoutFlow,
    user: Option<UserId>,
    last_error: Option<String>,
    redirect: Option<HostedRedirect>,
}

/// State shared with in-flight calls, which may outlive the caller.
#[derive(Debug, Default)]
struct Shared {
    state: Mutex<CheckoutState>,
    processing: AtomicBool,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, CheckoutState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, err: CheckoutError) -> CheckoutError {
        tracing::warn!(error = %err, "checkout failed");
        self.state().last_error = Some(err.user_message());
        err
    }
}

/// Turns the cart into a hosted-payment redirect or a reservation.
///
/// All methods take `&self`; a single orchestrator is shared by the view
/// that renders the checkout dialog. At most one external call runs at a
/// time: while one is in flight, further submissions fail with
/// [`CheckoutError::AlreadyInFlight`] without calling anything.
///
/// A reservation write runs on its own task. Abandoning
/// [`submit_reservation`](Self::submit_reservation) drops only its result:
/// the write, any cleanup of a half-written order and the cart update still
/// complete, and the call stays in flight until they do.
pub struct CheckoutOrchestrator {
    cart: Arc<CartStore>,
    identity: Arc<dyn IdentityProvider>,
    payments: Arc<dyn PaymentGateway>,
    orders: Arc<dyn OrderStore>,
    config: CheckoutConfig,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("step", &self.step())
            .field("processing", &self.is_processing())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Marks an external call in flight.
///
/// Dropping it without [`settle`](InFlight::settle), which happens when the
/// caller abandons the future, puts the flow back where the submission
/// started. Either way the processing flag is released.
struct InFlight {
    shared: Arc<Shared>,
    fallback: CheckoutStep,
    settled: bool,
}

impl InFlight {
    fn settle(mut self, event: CheckoutEvent) -> CheckoutStep {
        self.settled = true;
        let mut state = self.shared.state();
        match state.flow.transition(event) {
            Ok(step) => step,
            Err(e) => {
                tracing::error!(error = %e, "in-flight checkout step changed underneath the call");
                state.flow.step()
            }
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = self.shared.state();
            tracing::warn!(step = %state.flow.step(), "checkout call abandoned before completion");
            state.flow.restore(self.fallback);
        }
        self.shared.processing.store(false, Ordering::Release);
    }
}

/// Writes a reservation, cleaning up after a write that fails halfway.
struct ReservationWriter {
    orders: Arc<dyn OrderStore>,
    policy: PartialWritePolicy,
}

impl ReservationWriter {
    async fn persist(
        &self,
        order: &NewOrder,
        lines: &[OrderLineDraft],
    ) -> Result<OrderSummary, CheckoutError> {
        if self.orders.supports_atomic_writes() {
            tracing::debug!("writing reservation in one call");
            return self
                .orders
                .create_reservation(order, lines)
                .await
                .map_err(CheckoutError::OrderWriteFailed);
        }

        let created = self
            .orders
            .create_order(order)
            .await
            .map_err(CheckoutError::OrderWriteFailed)?;
        tracing::debug!(order = %created.id, "order row written");

        let new_lines: Vec<NewOrderLine> = lines
            .iter()
            .map(|line| NewOrderLine::new(created.id.clone(), line))
            .collect();
        match self.orders.create_order_lines(&new_lines).await {
            Ok(lines) => Ok(OrderSummary {
                order: created,
                lines,
            }),
            Err(source) => {
                tracing::error!(order = %created.id, error = %source, "order lines failed to write");
                let cleanup = self.clean_up_partial_order(&created.id).await;
                Err(CheckoutError::OrderLinesWriteFailed {
                    order_id: created.id,
                    source,
                    cleanup,
                })
            }
        }
    }

    async fn clean_up_partial_order(&self, id: &OrderId) -> PartialWriteOutcome {
        let (result, outcome) = match self.policy {
            PartialWritePolicy::Compensate => (
                self.orders.delete_order(id).await,
                PartialWriteOutcome::RolledBack,
            ),
            PartialWritePolicy::MarkCancelled => (
                self.orders
                    .update_order_status(id, OrderStatus::Cancelled)
                    .await
                    .map(|_| ()),
                PartialWriteOutcome::MarkedCancelled,
            ),
        };

        match result {
            Ok(()) => {
                tracing::warn!(order = %id, outcome = %outcome, "partial reservation cleaned up");
                outcome
            }
            Err(e) => {
                tracing::error!(order = %id, error = %e, "partial reservation cleanup failed");
                PartialWriteOutcome::CleanupFailed(e.to_string())
            }
        }
    }
}

impl CheckoutOrchestrator {
    pub fn new(
        cart: Arc<CartStore>,
        identity: Arc<dyn IdentityProvider>,
        payments: Arc<dyn PaymentGateway>,
        orders: Arc<dyn OrderStore>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            cart,
            identity,
            payments,
            orders,
            config,
            shared: Arc::default(),
        }
    }

    /// The current step.
    pub fn step(&self) -> CheckoutStep {
        self.state().flow.step()
    }

    /// Whether an external call is in flight. Views disable submit controls
    /// while this is true.
    pub fn is_processing(&self) -> bool {
        self.shared.processing.load(Ordering::Acquire)
    }

    /// The user-facing message of the last failure in this attempt.
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    /// The user resolved by the last identity check.
    pub fn user(&self) -> Option<UserId> {
        self.state().user.clone()
    }

    /// The last hosted-payment redirect handed out.
    pub fn last_redirect(&self) -> Option<HostedRedirect> {
        self.state().redirect.clone()
    }

    pub fn cart(&self) -> &Arc<CartStore> {
        &self.cart
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Start checkout: re-resolve the current user and move to the
    /// payment-method choice.
    ///
    /// Without a signed-in user (and with guest checkout disabled) the flow
    /// ends in [`CheckoutStep::RedirectToSignIn`] and this returns
    /// [`CheckoutError::NotAuthenticated`]; nothing else is called.
    #[tracing::instrument(skip_all)]
    pub async fn begin(&self) -> Result<CheckoutStep, CheckoutError> {
        if self.cart.is_empty() {
            return Err(self.record(CheckoutError::EmptyCart));
        }

        let call = self.enter(CheckoutEvent::Begin)?;
        let user = match self.identity.current_user().await {
            Ok(user) => user,
            Err(e) => {
                call.settle(CheckoutEvent::AuthCheckFailed);
                return Err(self.record(CheckoutError::IdentityUnavailable(e)));
            }
        };

        self.state().user = user.clone();
        match user {
            Some(user) => {
                tracing::info!(user = %user, items = self.cart.total_item_count(), "checkout started");
                Ok(call.settle(CheckoutEvent::UserResolved))
            }
            None if self.config.allow_guest_checkout => {
                tracing::info!(items = self.cart.total_item_count(), "guest checkout started");
                Ok(call.settle(CheckoutEvent::UserResolved))
            }
            None => {
                call.settle(CheckoutEvent::NoUser);
                tracing::info!("checkout requires sign-in");
                Err(self.record(CheckoutError::NotAuthenticated))
            }
        }
    }

    /// Pay now: request a hosted-payment session for the cart.
    ///
    /// The cart is left as it is; it is emptied by
    /// [`handle_return`](Self::handle_return) once the provider reports success.
    #[tracing::instrument(skip_all)]
    pub async fn choose_pay_now(&self) -> Result<HostedRedirect, CheckoutError> {
        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(self.record(CheckoutError::EmptyCart));
        }

        let call = self.enter(CheckoutEvent::PickPayNow)?;
        let request =
            PaymentSessionRequest::from_cart(&cart, &self.config.return_url).for_user(self.user());
        tracing::info!(items = request.items.len(), total = %request.total(), "creating payment session");

        let outcome = match self.payments.create_session(&request).await {
            Ok(session) => session.into_redirect(),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(redirect) => {
                call.settle(CheckoutEvent::SessionCreated);
                tracing::info!(session = ?redirect.session_id, order = ?redirect.order_id, "payment session created");
                self.state().redirect = Some(redirect.clone());
                Ok(redirect)
            }
            Err(message) => {
                call.settle(CheckoutEvent::SessionFailed);
                Err(self.record(CheckoutError::PaymentSessionFailed(message)))
            }
        }
    }

    /// Reserve: move to the contact-details form.
    pub fn choose_reserve(&self) -> Result<CheckoutStep, CheckoutError> {
        self.state().flow.transition(CheckoutEvent::PickReserve)
    }

    /// Leave the method choice or the reservation form with no side effects.
    pub fn cancel(&self) -> Result<CheckoutStep, CheckoutError> {
        let mut state = self.state();
        let step = state.flow.transition(CheckoutEvent::Cancel)?;
        state.last_error = None;
        tracing::info!("checkout cancelled");
        Ok(step)
    }

    /// Submit the reservation form.
    ///
    /// Missing fields fail locally with [`CheckoutError::ValidationFailed`].
    /// Otherwise one order (status `reserved`, total equal to the cart total)
    /// and one line per cart item are written, and the ordered lines are
    /// removed from the cart. On any write failure the cart is untouched and
    /// the flow returns to the form.
    #[tracing::instrument(skip_all)]
    pub async fn submit_reservation(
        &self,
        request: ReservationRequest,
    ) -> Result<OrderSummary, CheckoutError> {
        if self.is_processing() {
            return Err(CheckoutError::AlreadyInFlight);
        }

        let missing = request.missing_fields();
        if !missing.is_empty() {
            self.state().flow.transition(CheckoutEvent::FieldsMissing)?;
            return Err(self.record(CheckoutError::ValidationFailed { missing }));
        }

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(self.record(CheckoutError::EmptyCart));
        }

        let call = self.enter(CheckoutEvent::FieldsValid)?;
        let mut order = NewOrder::new(self.user(), cart.total_price(), OrderStatus::Reserved);
        request.apply_to(&mut order);
        let lines: Vec<OrderLineDraft> = cart.items().iter().map(OrderLineDraft::from).collect();

        let writer = ReservationWriter {
            orders: Arc::clone(&self.orders),
            policy: self.config.partial_write_policy,
        };
        let store = Arc::clone(&self.cart);
        let shared = Arc::clone(&self.shared);
        let write = tokio::spawn(
            async move {
                match writer.persist(&order, &lines).await {
                    Ok(summary) => {
                        tracing::info!(
                            order = %summary.order.id,
                            total = %summary.order.total_amount,
                            lines = summary.lines.len(),
                            "reservation recorded"
                        );
                        if let Err(e) = store.remove_ordered(cart.items()) {
                            tracing::error!(order = %summary.order.id, error = %e, "reservation recorded but cart was not cleared");
                        }
                        call.settle(CheckoutEvent::OrderPersisted);
                        Ok(summary)
                    }
                    Err(e) => {
                        let err = shared.record(e);
                        call.settle(CheckoutEvent::OrderFailed);
                        Err(err)
                    }
                }
            }
            .in_current_span(),
        );

        match write.await {
            Ok(result) => result,
            Err(e) => Err(self.record(CheckoutError::OrderWriteFailed(BackendError::Storage(
                format!("reservation write did not finish: {e}"),
            )))),
        }
    }

    /// Handle the shopper's arrival on the payment return route.
    ///
    /// Empties the cart only for a successful return that carries a session
    /// id. Returns whether the cart was emptied.
    #[tracing::instrument(skip_all, fields(success = ret.success))]
    pub fn handle_return(&self, ret: &CheckoutReturn) -> Result<bool, CheckoutError> {
        let clear = ret.should_clear_cart();
        if clear {
            self.cart.clear()?;
            tracing::info!(session = ?ret.session_id, "payment confirmed, cart cleared");
        } else {
            tracing::info!("payment not confirmed, cart kept");
        }

        let mut state = self.state();
        if state.flow.step() == CheckoutStep::AwaitingRedirect {
            state
                .flow
                .transition(CheckoutEvent::PaymentReturned { success: clear })?;
        }
        Ok(clear)
    }

    /// Claim the processing flag and apply `event`.
    fn enter(&self, event: CheckoutEvent) -> Result<InFlight, CheckoutError> {
        if self
            .shared
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(event = event.as_str(), "checkout call already in flight");
            return Err(CheckoutError::AlreadyInFlight);
        }

        let mut state = self.state();
        let fallback = state.flow.step();
        if let Err(e) = state.flow.transition(event) {
            drop(state);
            self.shared.processing.store(false, Ordering::Release);
            return Err(e);
        }
        state.last_error = None;

        Ok(InFlight {
            shared: Arc::clone(&self.shared),
            fallback,
            settled: false,
        })
    }

    fn record(&self, err: CheckoutError) -> CheckoutError {
        self.shared.record(err)
    }

    fn state(&self) -> MutexGuard<'_, CheckoutState> {
        self.shared.state()
    }
}
