// tests/return_flow_tests.rs
mod common;

use async_trait::async_trait;
use cacao_checkout::checkout::outcome::ViewAction;
use cacao_checkout::checkout::settings::{AUTO_CONFIRM_NOTE, MIN_POLL_INTERVAL};
use cacao_checkout::checkout::ConfirmationPhase;
use cacao_checkout::model::OrderStatus;
use cacao_checkout::session::{MemorySessionStore, SessionStore, StoredSession};
use cacao_checkout::{
  CheckoutCoordinator, CheckoutSettings, CheckoutState, PaymentView, PollPolicy, ReturnRoute, SessionContext,
};
use common::*;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const ORDER_NUMBER: &str = "ORD-20240501-0042";

/// Counts how often a stored payment reference gets released.
#[derive(Default)]
struct CountingStore {
  inner: MemorySessionStore,
  releases: AtomicUsize,
}

#[async_trait]
impl SessionStore for CountingStore {
  async fn load(&self, session_key: &str) -> cacao_checkout::Result<StoredSession> {
    self.inner.load(session_key).await
  }

  async fn store(&self, session_key: &str, session: StoredSession) -> cacao_checkout::Result<()> {
    let before = self.inner.load(session_key).await?;
    if before.payment_id.is_some() && session.payment_id.is_none() {
      self.releases.fetch_add(1, Ordering::SeqCst);
    }
    self.inner.store(session_key, session).await
  }
}

async fn track_payment(h: &Harness) {
  h.session.save_payment_reference("pay_abc", ORDER_NUMBER).await.unwrap();
}

#[tokio::test(start_paused = true)]
#[serial]
async fn confirms_exactly_once_after_first_success() {
  setup_tracing();
  let h = harness();
  track_payment(&h).await;
  h.backend.script_statuses(&["PENDING", "PENDING", "CAPTURED"]);

  let watch = h.coordinator.mount_return(ReturnRoute::Success, Some("pay_abc")).await;
  let snapshot = watch.finished().await;

  assert_eq!(snapshot.state, CheckoutState::Done);
  assert_eq!(snapshot.confirmation, ConfirmationPhase::Confirmed);
  assert!(matches!(snapshot.view, PaymentView::Success { .. }));
  // Three polls, then one re-read after the order was confirmed.
  assert_eq!(FakeBackend::calls(&h.backend.payment_calls), 4);
  assert_eq!(FakeBackend::calls(&h.backend.update_status_calls), 1);

  let updates = h.backend.status_updates.lock();
  assert_eq!(updates[0].order_id, 42);
  assert_eq!(updates[0].status, OrderStatus::Confirmed);
  assert_eq!(updates[0].notes.as_deref(), Some(AUTO_CONFIRM_NOTE));
  assert_eq!(h.backend.orders.lock()[ORDER_NUMBER].status, OrderStatus::Confirmed);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn failed_payment_keeps_reference_and_skips_confirmation() {
  setup_tracing();
  let h = harness();
  track_payment(&h).await;
  h.backend.script_statuses(&["PENDING", "FAILED"]);

  let snapshot = h
    .coordinator
    .mount_return(ReturnRoute::Success, Some("pay_abc")).await
    .finished()
    .await;

  assert_eq!(snapshot.state, CheckoutState::Failed);
  assert_eq!(snapshot.actions, vec![ViewAction::TryAgain, ViewAction::ContinueShopping]);
  assert_eq!(FakeBackend::calls(&h.backend.update_status_calls), 0);
  assert_eq!(h.session.payment_id().await.unwrap().as_deref(), Some("pay_abc"));
  assert_eq!(h.session.load().await.unwrap().order_number.as_deref(), Some(ORDER_NUMBER));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn success_releases_stored_reference_once() {
  setup_tracing();
  let backend = FakeBackend::new();
  let store = Arc::new(CountingStore::default());
  let session = SessionContext::new(store.clone(), SESSION_KEY);
  session.save_payment_reference("pay_abc", ORDER_NUMBER).await.unwrap();
  session.set_auth_token("jwt-abc").await.unwrap();
  let coordinator = CheckoutCoordinator::new(backend.clone(), backend.clone(), session.clone(), CheckoutSettings::default());
  backend.script_statuses(&["CAPTURED"]);

  let snapshot = coordinator.mount_return(ReturnRoute::Success, None).await.finished().await;

  assert_eq!(snapshot.payment_id.as_deref(), Some("pay_abc"));
  assert_eq!(snapshot.state, CheckoutState::Done);
  assert_eq!(store.releases.load(Ordering::SeqCst), 1);
  assert_eq!(session.payment_id().await.unwrap(), None);
  assert_eq!(session.auth_token().await.unwrap().as_deref(), Some("jwt-abc"));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn already_confirmed_order_is_left_alone() {
  setup_tracing();
  let h = harness();
  h.backend.script_payments(vec![Reply::Ok(Some(sample_payment("COMPLETED", OrderStatus::Confirmed)))]);

  let snapshot = h
    .coordinator
    .mount_return(ReturnRoute::Success, Some("pay_abc")).await
    .finished()
    .await;

  assert_eq!(snapshot.confirmation, ConfirmationPhase::NotNeeded);
  assert_eq!(snapshot.state, CheckoutState::Done);
  assert_eq!(FakeBackend::calls(&h.backend.order_calls), 0);
  assert_eq!(FakeBackend::calls(&h.backend.update_status_calls), 0);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn verification_runs_once_per_mount() {
  setup_tracing();
  let h = harness();
  h.backend.script_statuses(&["PENDING", "PENDING", "AUTHORIZED"]);

  let watch = h.coordinator.mount_return(ReturnRoute::Success, Some("pay_abc")).await;
  for _ in 0..20 {
    let _ = watch.snapshot();
    tokio::task::yield_now().await;
  }
  watch.finished().await;
  assert_eq!(FakeBackend::calls(&h.backend.verify_calls), 1);
  assert_eq!(h.backend.verify_requests.lock()[0].gateway_name, "ZIINA");

  // A fresh mount starts over and verifies again.
  h.coordinator
    .mount_return(ReturnRoute::Success, Some("pay_abc")).await
    .finished()
    .await;
  assert_eq!(FakeBackend::calls(&h.backend.verify_calls), 2);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn settled_verification_triggers_an_early_refresh() {
  setup_tracing();
  let h = harness();
  h.backend.script_statuses(&["PENDING"]);
  if let Reply::Ok(verification) = &mut *h.backend.verify_reply.lock() {
    verification.status = Some("completed".to_string());
  }

  let watch = h.coordinator.mount_return(ReturnRoute::Success, Some("pay_abc")).await;
  tokio::time::sleep(Duration::from_millis(1500)).await;

  // One immediate poll, one refresh a second after verification; the next tick is at 3s.
  assert_eq!(watch.snapshot().polls, 2);
  assert_eq!(FakeBackend::calls(&h.backend.payment_calls), 2);
  watch.unmount();
}

#[tokio::test(start_paused = true)]
#[serial]
async fn unmount_stops_polling_and_discards_late_results() {
  setup_tracing();
  let h = harness();
  h.backend.script_statuses(&["CAPTURED"]);
  *h.backend.payment_delay.lock() = Duration::from_secs(5);

  let watch = h.coordinator.mount_return(ReturnRoute::Success, Some("pay_abc")).await;
  tokio::time::sleep(Duration::from_secs(1)).await;
  assert_eq!(FakeBackend::calls(&h.backend.payment_calls), 1);

  watch.unmount();
  assert!(!watch.is_mounted());
  tokio::time::sleep(Duration::from_secs(30)).await;

  let snapshot = watch.snapshot();
  assert_eq!(snapshot.view, PaymentView::Verifying);
  assert_eq!(snapshot.state, CheckoutState::Verifying);
  assert_eq!(FakeBackend::calls(&h.backend.payment_calls), 1);
  assert_eq!(FakeBackend::calls(&h.backend.update_status_calls), 0);

  watch.finished().await;
  assert_eq!(FakeBackend::calls(&h.backend.payment_calls), 1);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn unknown_payment_id_shows_not_found() {
  setup_tracing();
  let h = harness();

  let snapshot = h
    .coordinator
    .mount_return(ReturnRoute::Success, Some("pay_123")).await
    .finished()
    .await;

  assert_eq!(snapshot.view, PaymentView::NotFound);
  assert_eq!(snapshot.actions, vec![ViewAction::ContinueShopping]);
  assert_eq!(snapshot.state, CheckoutState::Failed);
  assert_eq!(FakeBackend::calls(&h.backend.payment_calls), 1);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn no_payment_id_anywhere_makes_no_call() {
  setup_tracing();
  let h = harness();

  let snapshot = h.coordinator.mount_return(ReturnRoute::Success, Some("  ")).await.finished().await;

  assert_eq!(snapshot.view, PaymentView::NotFound);
  assert_eq!(snapshot.payment_id, None);
  assert_eq!(h.backend.remote_calls(), 0);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn failed_confirmation_is_swallowed_and_payment_reread() {
  setup_tracing();
  let h = harness();
  track_payment(&h).await;
  h.backend.script_statuses(&["CAPTURED"]);
  *h.backend.update_reply.lock() = Reply::Network("connection reset".to_string());

  let started = tokio::time::Instant::now();
  let snapshot = h
    .coordinator
    .mount_return(ReturnRoute::Success, Some("pay_abc")).await
    .finished()
    .await;

  assert_eq!(snapshot.confirmation, ConfirmationPhase::Deferred);
  assert_eq!(snapshot.state, CheckoutState::Done);
  assert!(matches!(snapshot.view, PaymentView::Success { .. }));
  assert_eq!(FakeBackend::calls(&h.backend.update_status_calls), 1);
  assert_eq!(FakeBackend::calls(&h.backend.payment_calls), 2);
  assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn poll_error_shows_error_view() {
  setup_tracing();
  let h = harness();
  h.backend.script_payments(vec![Reply::Service("Payment lookup failed".to_string())]);

  let snapshot = h
    .coordinator
    .mount_return(ReturnRoute::Success, Some("pay_abc")).await
    .finished()
    .await;

  assert_eq!(
    snapshot.view,
    PaymentView::Error {
      message: "Payment lookup failed".to_string()
    }
  );
  assert_eq!(snapshot.actions, vec![ViewAction::ReturnToCart]);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn bounded_policy_gives_up() {
  setup_tracing();
  let settings = CheckoutSettings {
    poll: PollPolicy {
      interval: Duration::from_secs(3),
      max_attempts: Some(2),
      max_duration: None,
    },
    ..CheckoutSettings::default()
  };
  let h = harness_with(settings);
  h.backend.script_statuses(&["PENDING"]);

  let snapshot = h
    .coordinator
    .mount_return(ReturnRoute::Success, Some("pay_abc")).await
    .finished()
    .await;

  assert!(snapshot.polling_exhausted);
  assert_eq!(snapshot.polls, 2);
  assert!(matches!(snapshot.view, PaymentView::Pending { .. }));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn cancel_route_reads_once_and_keeps_reference() {
  setup_tracing();
  let h = harness();
  track_payment(&h).await;
  h.backend.script_statuses(&["PENDING"]);

  let snapshot = h.coordinator.mount_return(ReturnRoute::Cancel, None).await.finished().await;

  assert_eq!(snapshot.state, CheckoutState::Cancelled);
  assert_eq!(
    snapshot.view,
    PaymentView::Cancelled {
      payment_id: Some("pay_abc".to_string()),
      order_number: Some(ORDER_NUMBER.to_string()),
    }
  );
  assert_eq!(snapshot.actions, vec![ViewAction::ReturnToCart, ViewAction::ContinueShopping]);
  assert_eq!(FakeBackend::calls(&h.backend.payment_calls), 1);
  assert_eq!(FakeBackend::calls(&h.backend.verify_calls), 1);
  assert_eq!(h.session.payment_id().await.unwrap().as_deref(), Some("pay_abc"));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn failure_route_without_record_shows_plain_failure() {
  setup_tracing();
  let h = harness();

  let snapshot = h
    .coordinator
    .mount_return(ReturnRoute::Failure, Some("pay_gone")).await
    .finished()
    .await;

  assert_eq!(snapshot.state, CheckoutState::Failed);
  assert_eq!(
    snapshot.view,
    PaymentView::Failed {
      payment_id: None,
      order_number: None,
    }
  );
  assert_eq!(FakeBackend::calls(&h.backend.payment_calls), 1);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn unrecognised_status_is_shown_verbatim_while_polling_continues() {
  setup_tracing();
  let h = harness();
  track_payment(&h).await;
  h.backend.script_statuses(&["REFUND_PENDING", "REFUND_PENDING", "CAPTURED"]);

  let watch = h.coordinator.mount_return(ReturnRoute::Success, Some("pay_abc")).await;
  tokio::time::sleep(Duration::from_millis(3500)).await;

  let snapshot = watch.snapshot();
  assert_eq!(
    snapshot.view,
    PaymentView::Unknown {
      status: "REFUND_PENDING".to_string()
    }
  );
  assert_eq!(snapshot.message, "Payment status: REFUND_PENDING");
  assert_eq!(snapshot.actions, vec![ViewAction::ContinueShopping]);
  assert_eq!(snapshot.state, CheckoutState::Verifying);
  assert_eq!(snapshot.polls, 2);
  assert_eq!(FakeBackend::calls(&h.backend.update_status_calls), 0);

  let snapshot = watch.finished().await;
  assert_eq!(snapshot.state, CheckoutState::Done);
  assert!(matches!(snapshot.view, PaymentView::Success { .. }));
  assert_eq!(snapshot.title, "Payment Successful!");
  assert_eq!(FakeBackend::calls(&h.backend.update_status_calls), 1);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn zero_poll_interval_still_settles() {
  setup_tracing();
  let settings = CheckoutSettings {
    poll: PollPolicy {
      interval: Duration::ZERO,
      ..PollPolicy::default()
    },
    ..CheckoutSettings::default()
  };
  let h = harness_with(settings);
  h.backend.script_statuses(&["PENDING", "PENDING", "CAPTURED"]);

  let started = tokio::time::Instant::now();
  let snapshot = h
    .coordinator
    .mount_return(ReturnRoute::Success, Some("pay_abc"))
    .await
    .finished()
    .await;

  assert_eq!(snapshot.state, CheckoutState::Done);
  assert!(matches!(snapshot.view, PaymentView::Success { .. }));
  assert!(started.elapsed() >= MIN_POLL_INTERVAL * 2);
}
