//! Checkout flow state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::checkout::CheckoutError;

/// Steps in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// No checkout in progress.
    #[default]
    Idle,
    /// Resolving the current user.
    RequireAuthCheck,
    /// Nobody is signed in; the shopper must sign in first.
    RedirectToSignIn,
    /// Picking between hosted payment and reservation.
    ChoosingMethod,
    /// Waiting for the payment provider to create a session.
    SubmittingPayment,
    /// A hosted-payment URL was handed out.
    AwaitingRedirect,
    /// Entering reservation contact details.
    FillingReservation,
    /// Waiting for the order and its lines to be written.
    SubmittingReservation,
    /// The reservation was recorded.
    Success,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Idle => "idle",
            CheckoutStep::RequireAuthCheck => "require_auth_check",
            CheckoutStep::RedirectToSignIn => "redirect_to_sign_in",
            CheckoutStep::ChoosingMethod => "choosing_method",
            CheckoutStep::SubmittingPayment => "submitting_payment",
            CheckoutStep::AwaitingRedirect => "awaiting_redirect",
            CheckoutStep::FillingReservation => "filling_reservation",
            CheckoutStep::SubmittingReservation => "submitting_reservation",
            CheckoutStep::Success => "success",
        }
    }

    /// Whether this step ends a checkout attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutStep::RedirectToSignIn | CheckoutStep::AwaitingRedirect | CheckoutStep::Success
        )
    }

    /// Whether an external call is in flight in this step.
    pub fn is_submitting(&self) -> bool {
        matches!(
            self,
            CheckoutStep::RequireAuthCheck
                | CheckoutStep::SubmittingPayment
                | CheckoutStep::SubmittingReservation
        )
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that move the flow between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutEvent {
    /// The shopper asked to check out.
    Begin,
    /// A current user was found (or guests are allowed).
    UserResolved,
    /// Nobody is signed in.
    NoUser,
    /// The identity lookup itself failed.
    AuthCheckFailed,
    PickPayNow,
    PickReserve,
    Cancel,
    SessionCreated,
    SessionFailed,
    FieldsValid,
    FieldsMissing,
    OrderPersisted,
    OrderFailed,
    /// The shopper came back from the hosted page.
    PaymentReturned { success: bool },
}

impl CheckoutEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutEvent::Begin => "begin",
            CheckoutEvent::UserResolved => "user_resolved",
            CheckoutEvent::NoUser => "no_user",
            CheckoutEvent::AuthCheckFailed => "auth_check_failed",
            CheckoutEvent::PickPayNow => "pick_pay_now",
            CheckoutEvent::PickReserve => "pick_reserve",
            CheckoutEvent::Cancel => "cancel",
            CheckoutEvent::SessionCreated => "session_created",
            CheckoutEvent::SessionFailed => "session_failed",
            CheckoutEvent::FieldsValid => "fields_valid",
            CheckoutEvent::FieldsMissing => "fields_missing",
            CheckoutEvent::OrderPersisted => "order_persisted",
            CheckoutEvent::OrderFailed => "order_failed",
            CheckoutEvent::PaymentReturned { .. } => "payment_returned",
        }
    }
}

/// The step a checkout attempt is in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutFlow {
    step: CheckoutStep,
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The step `event` leads to from the current step, if it is allowed.
    pub fn next_step(&self, event: CheckoutEvent) -> Option<CheckoutStep> {
        use CheckoutEvent as E;
        use CheckoutStep as S;

        let next = match (self.step, event) {
            (S::Idle | S::RedirectToSignIn | S::AwaitingRedirect | S::Success, E::Begin) => {
                S::RequireAuthCheck
            }

            (S::RequireAuthCheck, E::UserResolved) => S::ChoosingMethod,
            (S::RequireAuthCheck, E::NoUser) => S::RedirectToSignIn,
            (S::RequireAuthCheck, E::AuthCheckFailed) => S::Idle,

            (S::ChoosingMethod, E::PickPayNow) => S::SubmittingPayment,
            (S::ChoosingMethod, E::PickReserve) => S::FillingReservation,
            (S::ChoosingMethod | S::FillingReservation, E::Cancel) => S::Idle,

            (S::SubmittingPayment, E::SessionCreated) => S::AwaitingRedirect,
            (S::SubmittingPayment, E::SessionFailed) => S::ChoosingMethod,

            (S::FillingReservation, E::FieldsValid) => S::SubmittingReservation,
            (S::FillingReservation, E::FieldsMissing) => S::FillingReservation,

            (S::SubmittingReservation, E::OrderPersisted) => S::Success,
            (S::SubmittingReservation, E::OrderFailed) => S::FillingReservation,

            (S::AwaitingRedirect, E::PaymentReturned { success: true }) => S::Success,
            (S::AwaitingRedirect, E::PaymentReturned { success: false }) => S::Idle,

            _ => return None,
        };
        Some(next)
    }

    /// Apply `event`, or fail without changing the step.
    pub fn transition(&mut self, event: CheckoutEvent) -> Result<CheckoutStep, CheckoutError> {
        let next = self
            .next_step(event)
            .ok_or(CheckoutError::InvalidTransition {
                from: self.step,
                event: event.as_str(),
            })?;
        tracing::debug!(from = %self.step, to = %next, event = event.as_str(), "checkout transition");
        self.step = next;
        Ok(next)
    }

    /// Put the flow back to `step` when a submission is abandoned mid-call.
    pub(crate) fn restore(&mut self, step: CheckoutStep) {
        self.step = step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CheckoutEvent as E;
    use CheckoutStep as S;

    fn flow_at(step: S) -> CheckoutFlow {
        CheckoutFlow { step }
    }

    #[test]
    fn test_reserve_path() {
        let mut flow = CheckoutFlow::new();
        for (event, expected) in [
            (E::Begin, S::RequireAuthCheck),
            (E::UserResolved, S::ChoosingMethod),
            (E::PickReserve, S::FillingReservation),
            (E::FieldsMissing, S::FillingReservation),
            (E::FieldsValid, S::SubmittingReservation),
            (E::OrderFailed, S::FillingReservation),
            (E::FieldsValid, S::SubmittingReservation),
            (E::OrderPersisted, S::Success),
        ] {
            assert_eq!(flow.transition(event).unwrap(), expected);
        }
    }

    #[test]
    fn test_pay_now_path() {
        let mut flow = flow_at(S::ChoosingMethod);
        assert_eq!(flow.transition(E::PickPayNow).unwrap(), S::SubmittingPayment);
        assert_eq!(flow.transition(E::SessionFailed).unwrap(), S::ChoosingMethod);
        flow.transition(E::PickPayNow).unwrap();
        assert_eq!(flow.transition(E::SessionCreated).unwrap(), S::AwaitingRedirect);
        assert!(flow.step().is_terminal());
        assert_eq!(
            flow.transition(E::PaymentReturned { success: true }).unwrap(),
            S::Success
        );
    }

    #[test]
    fn test_no_user_redirects_to_sign_in() {
        let mut flow = flow_at(S::RequireAuthCheck);
        assert_eq!(flow.transition(E::NoUser).unwrap(), S::RedirectToSignIn);
        assert_eq!(flow.transition(E::Begin).unwrap(), S::RequireAuthCheck);
    }

    #[test]
    fn test_cancel_only_before_submission() {
        assert_eq!(flow_at(S::ChoosingMethod).transition(E::Cancel).unwrap(), S::Idle);
        assert_eq!(flow_at(S::FillingReservation).transition(E::Cancel).unwrap(), S::Idle);
        assert!(flow_at(S::SubmittingPayment).transition(E::Cancel).is_err());
        assert!(flow_at(S::SubmittingReservation).transition(E::Cancel).is_err());
    }

    #[test]
    fn test_invalid_transition_keeps_step() {
        let mut flow = flow_at(S::FillingReservation);
        let err = flow.transition(E::PickPayNow).unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::InvalidTransition {
                from: S::FillingReservation,
                event: "pick_pay_now"
            }
        ));
        assert_eq!(flow.step(), S::FillingReservation);
    }

    #[test]
    fn test_begin_not_allowed_mid_attempt() {
        for step in [
            S::RequireAuthCheck,
            S::ChoosingMethod,
            S::SubmittingPayment,
            S::FillingReservation,
            S::SubmittingReservation,
        ] {
            assert!(flow_at(step).next_step(E::Begin).is_none(), "{step}");
        }
    }
}
