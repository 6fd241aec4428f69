// cacao_checkout/src/checkout/coordinator.rs

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::checkout::confirmation::{build_confirmation_pipeline, ConfirmationData};
use crate::checkout::return_flow::{self, ReturnDeps, ReturnRoute, ReturnWatch};
use crate::checkout::settings::CheckoutSettings;
use crate::checkout::state::{CheckoutState, SharedState};
use crate::checkout::submission::{
  build_submission_pipeline, CheckoutRedirect, SubmissionData, SESSION_FAILED_MESSAGE,
};
use crate::checkout::validation::{CheckoutForm, PaymentMethod};
use crate::error::{CheckoutError, Result};
use crate::flow::{FlowData, FlowOutcome};
use crate::model::Cart;
use crate::pipeline::Pipeline;
use crate::ports::{OrderService, PaymentGatewayClient};
use crate::session::SessionContext;

pub const CHECKOUT_IN_PROGRESS_MESSAGE: &str = "A checkout is already in progress";

/// The two pipelines a coordinator runs. Build once and share across coordinators.
#[derive(Clone)]
pub struct CheckoutPipelines {
  pub submission: Arc<Pipeline<SubmissionData, CheckoutError>>,
  pub confirmation: Arc<Pipeline<ConfirmationData, CheckoutError>>,
}

impl Default for CheckoutPipelines {
  fn default() -> Self {
    Self {
      submission: Arc::new(build_submission_pipeline()),
      confirmation: Arc::new(build_confirmation_pipeline()),
    }
  }
}

/// Drives one shopper's checkout: submission up to the gateway redirect, and the
/// return routes after it.
pub struct CheckoutCoordinator {
  orders: Arc<dyn OrderService>,
  payments: Arc<dyn PaymentGatewayClient>,
  session: SessionContext,
  settings: CheckoutSettings,
  pipelines: CheckoutPipelines,
  state: SharedState,
}

impl CheckoutCoordinator {
  pub fn new(
    orders: Arc<dyn OrderService>,
    payments: Arc<dyn PaymentGatewayClient>,
    session: SessionContext,
    settings: CheckoutSettings,
  ) -> Self {
    Self::with_pipelines(orders, payments, session, settings, CheckoutPipelines::default())
  }

  pub fn with_pipelines(
    orders: Arc<dyn OrderService>,
    payments: Arc<dyn PaymentGatewayClient>,
    session: SessionContext,
    settings: CheckoutSettings,
    pipelines: CheckoutPipelines,
  ) -> Self {
    Self {
      orders,
      payments,
      session,
      settings,
      pipelines,
      state: SharedState::default(),
    }
  }

  pub fn state(&self) -> CheckoutState {
    self.state.get()
  }

  pub fn session(&self) -> &SessionContext {
    &self.session
  }

  pub fn settings(&self) -> &CheckoutSettings {
    &self.settings
  }

  /// Validates the form, creates the order, opens a payment session and remembers the
  /// payment. Returns where to redirect the shopper.
  ///
  /// While a submission is in flight a second one is rejected without any remote call.
  /// Validation failures put the coordinator back to `Idle` and make no remote call. Any
  /// other failure ends the attempt in `Failed`; nothing is retried.
  #[instrument(
    name = "CheckoutCoordinator::submit",
    skip_all,
    fields(session_key = %self.session.session_key(), items = cart.items.len()),
    err(Display)
  )]
  pub async fn submit(&self, cart: &Cart, form: CheckoutForm, method: PaymentMethod) -> Result<CheckoutRedirect> {
    if !self.state.begin_submission() {
      info!("Rejected submit while another is in flight.");
      return Err(CheckoutError::Validation(CHECKOUT_IN_PROGRESS_MESSAGE.to_string()));
    }

    let data = FlowData::new(SubmissionData {
      session: self.session.clone(),
      orders: self.orders.clone(),
      payments: self.payments.clone(),
      settings: self.settings.clone(),
      form,
      cart: cart.clone(),
      method,
      state: self.state.clone(),
      order: None,
      opened_session: None,
      redirect: None,
    });

    let outcome = self.pipelines.submission.run(data.clone()).await;
    let redirect = data.update(|d| d.redirect.take());
    let reached = self.state.get();

    match outcome {
      Ok(FlowOutcome::Completed) => {
        let Some(redirect) = redirect else {
          self.state.set(CheckoutState::Failed);
          return Err(CheckoutError::Service(SESSION_FAILED_MESSAGE.to_string()));
        };
        info!(order_number = %redirect.order_number, payment_id = %redirect.payment_id, "Redirecting shopper to gateway.");
        Ok(redirect)
      }
      Ok(FlowOutcome::Stopped) => {
        self.state.set(CheckoutState::Failed);
        Err(CheckoutError::Service(SESSION_FAILED_MESSAGE.to_string()))
      }
      Err(e) => {
        let next = if e.is_local() { CheckoutState::Idle } else { CheckoutState::Failed };
        self.state.set(next);
        match &e {
          CheckoutError::Validation(message) => info!(%message, "Checkout rejected locally."),
          other => error!(error = %other, reached = %reached, "Checkout failed."),
        }
        Err(e)
      }
    }
  }

  /// Mounts a return route. `query_payment_id` wins when present and non-blank;
  /// otherwise the persisted payment id is used. Must be called inside a tokio runtime.
  pub async fn mount_return(&self, route: ReturnRoute, query_payment_id: Option<&str>) -> ReturnWatch {
    let payment_id = match query_payment_id.map(str::trim).filter(|id| !id.is_empty()) {
      Some(id) => Some(id.to_string()),
      None => self.session.payment_id().await.unwrap_or_else(|e| {
        warn!(error = %e, "Could not read stored payment id.");
        None
      }),
    };
    info!(route = route.as_str(), payment_id = ?payment_id, "Mounting payment return route.");

    return_flow::mount(
      route,
      payment_id,
      ReturnDeps {
        orders: self.orders.clone(),
        payments: self.payments.clone(),
        session: self.session.clone(),
        settings: self.settings.clone(),
        confirmation: self.pipelines.confirmation.clone(),
      },
    )
  }

  /// Forgets the tracked payment without touching the backend.
  pub async fn abandon(&self) -> Result<()> {
    let cleared = self.session.clear_payment_reference().await?;
    self.state.set(CheckoutState::Idle);
    info!(cleared, "Checkout abandoned.");
    Ok(())
  }
}
