// cacao_checkout/src/checkout/return_flow.rs

//! What happens when the gateway sends the shopper back.
//!
//! Mounting a return route spawns one worker task. The worker fires a single payment
//! verification, then either polls the payment (success route) or reads it once
//! (cancel and failure routes), publishing a `ReturnSnapshot` after every change.
//! Dropping or unmounting the `ReturnWatch` stops the worker; anything that resolves
//! afterwards is discarded.

use serde::Serialize;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::checkout::confirmation::{confirm_paid_order, ConfirmationData, ConfirmationOutcome};
use crate::checkout::outcome::{interpret_payment, PaymentView, ViewAction};
use crate::checkout::settings::CheckoutSettings;
use crate::checkout::state::CheckoutState;
use crate::error::CheckoutError;
use crate::model::Payment;
use crate::pipeline::Pipeline;
use crate::ports::{OrderService, PaymentGatewayClient, VerifyPaymentRequest};
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnRoute {
  Success,
  Cancel,
  Failure,
}

impl ReturnRoute {
  pub fn as_str(self) -> &'static str {
    match self {
      ReturnRoute::Success => "success",
      ReturnRoute::Cancel => "cancel",
      ReturnRoute::Failure => "failure",
    }
  }
}

impl FromStr for ReturnRoute {
  type Err = CheckoutError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    match raw {
      "success" => Ok(ReturnRoute::Success),
      "cancel" => Ok(ReturnRoute::Cancel),
      "failure" => Ok(ReturnRoute::Failure),
      other => Err(CheckoutError::NotFound(format!("no payment return route '{}'", other))),
    }
  }
}

/// Progress of the once-per-mount order auto-confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmationPhase {
  NotAttempted,
  InFlight,
  Confirmed,
  /// The update failed; the payment is re-read instead of retrying the update.
  Deferred,
  /// Order was not PENDING (or not linked), so no update was sent.
  NotNeeded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnSnapshot {
  pub route: ReturnRoute,
  pub payment_id: Option<String>,
  pub state: CheckoutState,
  pub view: PaymentView,
  pub title: &'static str,
  pub message: String,
  pub actions: Vec<ViewAction>,
  pub confirmation: ConfirmationPhase,
  /// Payment reads issued so far.
  pub polls: u32,
  /// The poll policy ran out before a terminal status was seen.
  pub polling_exhausted: bool,
}

impl ReturnSnapshot {
  fn initial(route: ReturnRoute, payment_id: Option<String>) -> Self {
    Self {
      route,
      payment_id,
      state: CheckoutState::Returned,
      view: PaymentView::Verifying,
      title: PaymentView::Verifying.title(),
      message: PaymentView::Verifying.message(),
      actions: vec![],
      confirmation: ConfirmationPhase::NotAttempted,
      polls: 0,
      polling_exhausted: false,
    }
  }

  /// True once the worker has nothing left to do for this mount.
  pub fn is_settled(&self) -> bool {
    self.state.is_terminal() || self.polling_exhausted
  }
}

/// Handle to a mounted return route.
pub struct ReturnWatch {
  snapshots: watch::Receiver<ReturnSnapshot>,
  shutdown: watch::Sender<bool>,
  task: Option<JoinHandle<()>>,
}

impl ReturnWatch {
  /// Latest published snapshot. Reading it never triggers any remote call.
  pub fn snapshot(&self) -> ReturnSnapshot {
    self.snapshots.borrow().clone()
  }

  /// Stops polling. In-flight reads are dropped and never published.
  pub fn unmount(&self) {
    self.shutdown.send_replace(true);
  }

  pub fn is_mounted(&self) -> bool {
    !*self.shutdown.borrow()
  }

  /// Waits for the worker (and its verification call) to finish, then returns the
  /// final snapshot.
  pub async fn finished(mut self) -> ReturnSnapshot {
    if let Some(task) = self.task.take() {
      if let Err(e) = task.await {
        error!(error = %e, "Return watch worker did not finish cleanly.");
      }
    }
    self.snapshot()
  }
}

impl Drop for ReturnWatch {
  fn drop(&mut self) {
    self.shutdown.send_replace(true);
  }
}

impl std::fmt::Debug for ReturnWatch {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReturnWatch")
      .field("snapshot", &*self.snapshots.borrow())
      .field("mounted", &self.is_mounted())
      .finish()
  }
}

/// Everything a worker needs, handed over by the coordinator.
pub(crate) struct ReturnDeps {
  pub orders: Arc<dyn OrderService>,
  pub payments: Arc<dyn PaymentGatewayClient>,
  pub session: SessionContext,
  pub settings: CheckoutSettings,
  pub confirmation: Arc<Pipeline<ConfirmationData, CheckoutError>>,
}

/// Spawns the worker for `route`. Must be called inside a tokio runtime.
pub(crate) fn mount(route: ReturnRoute, payment_id: Option<String>, deps: ReturnDeps) -> ReturnWatch {
  let (publisher, snapshots) = watch::channel(ReturnSnapshot::initial(route, payment_id.clone()));
  let (shutdown_tx, shutdown_rx) = watch::channel(false);

  let span = info_span!(
    "return_watch",
    route = route.as_str(),
    payment_id = payment_id.as_deref().unwrap_or("-")
  );
  let worker = ReturnWorker {
    route,
    payment_id,
    deps,
    publisher,
    shutdown: shutdown_rx,
    verification: None,
  };
  let task = tokio::spawn(worker.run().instrument(span));

  ReturnWatch {
    snapshots,
    shutdown: shutdown_tx,
    task: Some(task),
  }
}

/// Resolves `fut` unless the watch is unmounted first.
async fn unless_unmounted<F: Future>(shutdown: &mut watch::Receiver<bool>, fut: F) -> Option<F::Output> {
  if *shutdown.borrow() {
    return None;
  }
  tokio::select! {
    biased;
    _ = shutdown.changed() => None,
    out = fut => Some(out),
  }
}

struct ReturnWorker {
  route: ReturnRoute,
  payment_id: Option<String>,
  deps: ReturnDeps,
  publisher: watch::Sender<ReturnSnapshot>,
  shutdown: watch::Receiver<bool>,
  verification: Option<JoinHandle<()>>,
}

impl ReturnWorker {
  fn is_unmounted(&self) -> bool {
    *self.shutdown.borrow() || self.shutdown.has_changed().is_err()
  }

  /// Applies `f` to the published snapshot, unless the watch was unmounted.
  fn publish(&self, f: impl FnOnce(&mut ReturnSnapshot)) -> bool {
    if self.is_unmounted() {
      return false;
    }
    self.publisher.send_modify(|snapshot| {
      f(snapshot);
      snapshot.title = snapshot.view.title();
      snapshot.message = snapshot.view.message();
      snapshot.actions = snapshot.view.actions();
    });
    true
  }

  fn state(&self) -> CheckoutState {
    self.publisher.borrow().state
  }

  fn advance(&self, next: CheckoutState, view: Option<PaymentView>) {
    let current = self.state();
    if !current.can_advance_to(next) {
      warn!(from = %current, to = %next, "Ignoring illegal return-route transition.");
      return;
    }
    self.publish(|s| {
      s.state = next;
      if let Some(view) = view {
        s.view = view;
      }
    });
  }

  async fn run(mut self) {
    let Some(payment_id) = self.payment_id.clone() else {
      info!("No payment id on return, nothing to verify.");
      self.advance(CheckoutState::Failed, Some(PaymentView::NotFound));
      return;
    };

    // Leaving Returned happens once per mount, and so does verification.
    self.advance(CheckoutState::Verifying, None);
    let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
    self.spawn_verification(&payment_id, refresh_tx);

    match self.route {
      ReturnRoute::Success => self.poll_until_settled(&payment_id, refresh_rx).await,
      ReturnRoute::Cancel | ReturnRoute::Failure => self.read_once(&payment_id).await,
    }

    if let Some(verification) = self.verification.take() {
      let _ = unless_unmounted(&mut self.shutdown, verification).await;
    }
    debug!("Return watch worker finished.");
  }

  fn spawn_verification(&mut self, payment_id: &str, refresh: mpsc::UnboundedSender<()>) {
    let payments = self.deps.payments.clone();
    let request = VerifyPaymentRequest {
      payment_id: payment_id.to_string(),
      gateway_name: self.deps.settings.gateway_name.clone(),
    };
    let refresh_delay = self.deps.settings.verify_refresh_delay;

    let handle = tokio::spawn(
      async move {
        match payments.verify(request).await {
          Ok(verification) if verification.reports_settled() => {
            info!(status = ?verification.status, "Gateway reports payment settled; refreshing shortly.");
            time::sleep(refresh_delay).await;
            let _ = refresh.send(());
          }
          Ok(verification) => {
            debug!(success = verification.success, status = ?verification.status, message = ?verification.message, "Verification did not report a settled payment.");
          }
          Err(e) => {
            warn!(error = %e, "Payment verification failed.");
          }
        }
      }
      .instrument(info_span!("verify_payment")),
    );
    self.verification = Some(handle);
  }

  async fn poll_until_settled(&mut self, payment_id: &str, mut refresh: mpsc::UnboundedReceiver<()>) {
    let policy = self.deps.settings.poll;
    let started = Instant::now();
    let mut ticker = time::interval(policy.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      let woke = unless_unmounted(&mut self.shutdown, async {
        tokio::select! {
          _ = ticker.tick() => {}
          Some(()) = refresh.recv() => debug!("Refresh requested after verification."),
        }
      })
      .await;
      if woke.is_none() {
        return;
      }

      let polls = self.publisher.borrow().polls;
      if !policy.allows(polls, started.elapsed()) {
        info!(polls, "Poll policy exhausted before a terminal status.");
        self.publish(|s| s.polling_exhausted = true);
        return;
      }

      let Some(payment) = self.read_payment(payment_id).await else {
        return;
      };
      let view = interpret_payment(&payment);
      match view {
        PaymentView::Success { .. } => {
          self.settle_success(&payment, view).await;
          return;
        }
        PaymentView::Failed { .. } => {
          info!("Payment failed.");
          self.advance(CheckoutState::Failed, Some(view));
          return;
        }
        _ => {
          debug!(status = %payment.status, "Payment not settled yet.");
          self.publish(|s| s.view = view);
        }
      }
    }
  }

  /// One read of the payment. `None` means stop: unmounted, missing, or errored (the
  /// latter two are published before returning).
  async fn read_payment(&mut self, payment_id: &str) -> Option<Payment> {
    self.publish(|s| s.polls += 1);
    let payments = self.deps.payments.clone();
    let result = unless_unmounted(&mut self.shutdown, payments.payment(payment_id)).await?;
    if self.is_unmounted() {
      return None;
    }
    match result {
      Ok(Some(payment)) => Some(payment),
      Ok(None) => {
        info!("Payment record not found.");
        self.advance(CheckoutState::Failed, Some(PaymentView::NotFound));
        None
      }
      Err(e) => {
        error!(error = %e, "Failed to read payment.");
        self.advance(
          CheckoutState::Failed,
          Some(PaymentView::Error {
            message: e.user_message(),
          }),
        );
        None
      }
    }
  }

  async fn settle_success(&mut self, payment: &Payment, view: PaymentView) {
    info!(status = %payment.status, "Payment succeeded.");
    match self.deps.session.clear_payment_reference().await {
      Ok(cleared) => debug!(cleared, "Stored payment reference released."),
      Err(e) => warn!(error = %e, "Could not clear stored payment reference."),
    }

    let order_number = payment
      .order
      .as_ref()
      .filter(|order| order.status.is_pending())
      .and_then(|order| order.order_number.clone());

    let Some(order_number) = order_number else {
      self.publish(|s| s.confirmation = ConfirmationPhase::NotNeeded);
      self.advance(CheckoutState::Done, Some(view));
      return;
    };

    self.publish(|s| s.confirmation = ConfirmationPhase::InFlight);
    self.advance(CheckoutState::ConfirmingOrder, Some(view));

    let pipeline = self.deps.confirmation.clone();
    let orders = self.deps.orders.clone();
    let note = self.deps.settings.confirmation_note.clone();
    let confirmed = unless_unmounted(
      &mut self.shutdown,
      confirm_paid_order(&pipeline, orders, &order_number, &note),
    )
    .await;

    let (phase, refresh_after) = match confirmed {
      None => return,
      Some(Ok(ConfirmationOutcome::Confirmed)) => (ConfirmationPhase::Confirmed, Duration::ZERO),
      Some(Ok(outcome)) => {
        debug!(?outcome, "Order did not need confirming.");
        (ConfirmationPhase::NotNeeded, Duration::ZERO)
      }
      Some(Err(e)) => {
        warn!(error = %e, %order_number, "Auto-confirmation failed; re-reading payment instead.");
        (ConfirmationPhase::Deferred, self.deps.settings.confirmation_retry_delay)
      }
    };
    self.publish(|s| s.confirmation = phase);
    self.advance(CheckoutState::Done, None);

    if unless_unmounted(&mut self.shutdown, time::sleep(refresh_after)).await.is_none() {
      return;
    }
    if let Some(refreshed) = self.read_payment(&payment.payment_id).await {
      let view = interpret_payment(&refreshed);
      if matches!(view, PaymentView::Success { .. }) {
        self.publish(|s| s.view = view);
      } else {
        warn!(status = %refreshed.status, "Payment no longer reads as successful after confirmation.");
      }
    }
  }

  async fn read_once(&mut self, payment_id: &str) {
    self.publish(|s| s.polls += 1);
    let payments = self.deps.payments.clone();
    let Some(result) = unless_unmounted(&mut self.shutdown, payments.payment(payment_id)).await else {
      return;
    };

    let (payment_id, order_number) = match result {
      Ok(Some(payment)) => (Some(payment.payment_id.clone()), payment.order_number().map(str::to_string)),
      Ok(None) => (None, None),
      Err(e) => {
        warn!(error = %e, "Could not read payment on return.");
        (None, None)
      }
    };

    match self.route {
      ReturnRoute::Cancel => {
        info!("Shopper cancelled the payment.");
        self.advance(
          CheckoutState::Cancelled,
          Some(PaymentView::Cancelled {
            payment_id,
            order_number,
          }),
        );
      }
      _ => {
        info!("Gateway reported a failed payment.");
        self.advance(
          CheckoutState::Failed,
          Some(PaymentView::Failed {
            payment_id,
            order_number,
          }),
        );
      }
    }
  }
}
