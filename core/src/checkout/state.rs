// cacao_checkout/src/checkout/state.rs

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::FlowError;

/// Where a checkout attempt is. Submission drives `Idle` to `Redirecting`; a return
/// route drives `Returned` to one of the terminal states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutState {
  #[default]
  Idle,
  OrderCreating,
  OrderCreated,
  PaymentSessionCreating,
  Redirecting,
  Returned,
  Verifying,
  ConfirmingOrder,
  Done,
  Failed,
  Cancelled,
}

impl CheckoutState {
  pub fn is_terminal(self) -> bool {
    matches!(self, CheckoutState::Done | CheckoutState::Failed | CheckoutState::Cancelled)
  }

  /// A submission owns the attempt while in one of these states.
  pub fn is_submitting(self) -> bool {
    matches!(
      self,
      CheckoutState::OrderCreating | CheckoutState::OrderCreated | CheckoutState::PaymentSessionCreating
    )
  }

  pub fn can_advance_to(self, next: CheckoutState) -> bool {
    use CheckoutState::*;
    matches!(
      (self, next),
      (Idle, OrderCreating)
        | (Idle, Failed)
        | (OrderCreating, OrderCreated)
        | (OrderCreating, Failed)
        | (OrderCreated, PaymentSessionCreating)
        | (PaymentSessionCreating, Redirecting)
        | (PaymentSessionCreating, Failed)
        | (Returned, Verifying)
        | (Returned, Failed)
        | (Returned, Cancelled)
        | (Verifying, ConfirmingOrder)
        | (Verifying, Done)
        | (Verifying, Failed)
        | (Verifying, Cancelled)
        | (ConfirmingOrder, Done)
    )
  }

  /// Moves `self` to `next`, rejecting edges the machine does not have.
  pub fn advance(&mut self, next: CheckoutState) -> Result<(), FlowError> {
    if !self.can_advance_to(next) {
      return Err(FlowError::Internal(format!(
        "illegal checkout transition {} -> {}",
        self, next
      )));
    }
    *self = next;
    Ok(())
  }
}

/// The state of one coordinator, shared with the submission run it started.
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<Mutex<CheckoutState>>);

impl SharedState {
  pub fn get(&self) -> CheckoutState {
    *self.0.lock()
  }

  pub fn set(&self, state: CheckoutState) {
    *self.0.lock() = state;
  }

  pub fn advance(&self, next: CheckoutState) -> Result<(), FlowError> {
    self.0.lock().advance(next)
  }

  /// Claims the attempt for a new submission by moving to `OrderCreating`.
  /// Returns false, leaving the state alone, while another submission holds it.
  pub fn begin_submission(&self) -> bool {
    let mut state = self.0.lock();
    if state.is_submitting() {
      return false;
    }
    *state = CheckoutState::OrderCreating;
    true
  }
}

impl fmt::Display for CheckoutState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      CheckoutState::Idle => "IDLE",
      CheckoutState::OrderCreating => "ORDER_CREATING",
      CheckoutState::OrderCreated => "ORDER_CREATED",
      CheckoutState::PaymentSessionCreating => "PAYMENT_SESSION_CREATING",
      CheckoutState::Redirecting => "REDIRECTING",
      CheckoutState::Returned => "RETURNED",
      CheckoutState::Verifying => "VERIFYING",
      CheckoutState::ConfirmingOrder => "CONFIRMING_ORDER",
      CheckoutState::Done => "DONE",
      CheckoutState::Failed => "FAILED",
      CheckoutState::Cancelled => "CANCELLED",
    };
    f.write_str(name)
  }
}
