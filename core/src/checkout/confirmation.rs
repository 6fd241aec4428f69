// cacao_checkout/src/checkout/confirmation.rs

//! Auto-confirmation of an order whose payment the gateway reported as successful.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{CheckoutError, Result};
use crate::flow::{FlowData, FlowOutcome, StepControl};
use crate::model::{Order, OrderStatus};
use crate::pipeline::Pipeline;
use crate::ports::{OrderService, UpdateOrderStatusRequest};

pub const CONFIRM_FAILED_MESSAGE: &str = "Failed to update order status";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
  Confirmed,
  /// The order had already left PENDING; nothing was sent.
  NotPending(OrderStatus),
  /// No order exists under that number; nothing was sent.
  OrderMissing,
}

pub struct ConfirmationData {
  pub orders: Arc<dyn OrderService>,
  pub order_number: String,
  pub note: String,
  pub order: Option<Order>,
  pub outcome: Option<ConfirmationOutcome>,
}

pub fn build_confirmation_pipeline() -> Pipeline<ConfirmationData, CheckoutError> {
  let mut p = Pipeline::new(
    "order_auto_confirmation",
    &[("fetch_order_details", false), ("update_order_status", false)],
  );
  p.on("fetch_order_details", fetch_order_details);
  p.on("update_order_status", update_order_status);
  p
}

/// Re-reads the order and, if it is still PENDING, marks it CONFIRMED with `note`.
#[instrument(name = "confirmation::run", skip(pipeline, orders, note), err(Display))]
pub async fn confirm_paid_order(
  pipeline: &Pipeline<ConfirmationData, CheckoutError>,
  orders: Arc<dyn OrderService>,
  order_number: &str,
  note: &str,
) -> Result<ConfirmationOutcome> {
  let data = FlowData::new(ConfirmationData {
    orders,
    order_number: order_number.to_string(),
    note: note.to_string(),
    order: None,
    outcome: None,
  });
  let run = pipeline.run(data.clone()).await?;
  let outcome = data.update(|d| d.outcome.take());
  match (run, outcome) {
    (FlowOutcome::Completed, _) => Ok(ConfirmationOutcome::Confirmed),
    (FlowOutcome::Stopped, Some(outcome)) => Ok(outcome),
    (FlowOutcome::Stopped, None) => Err(CheckoutError::Service(CONFIRM_FAILED_MESSAGE.to_string())),
  }
}

async fn fetch_order_details(data: FlowData<ConfirmationData>) -> Result<StepControl> {
  let (orders, order_number) = data.with(|d| (d.orders.clone(), d.order_number.clone()));

  match orders.order(&order_number).await? {
    None => {
      info!(%order_number, "Order not found, skipping confirmation.");
      data.update(|d| d.outcome = Some(ConfirmationOutcome::OrderMissing));
      Ok(StepControl::Stop)
    }
    Some(order) if !order.status.is_pending() => {
      info!(%order_number, status = %order.status, "Order no longer pending, skipping confirmation.");
      data.update(|d| d.outcome = Some(ConfirmationOutcome::NotPending(order.status.clone())));
      Ok(StepControl::Stop)
    }
    Some(order) => {
      data.update(|d| d.order = Some(order));
      Ok(StepControl::Continue)
    }
  }
}

async fn update_order_status(data: FlowData<ConfirmationData>) -> Result<StepControl> {
  let (orders, request) = data.with(|d| {
    let order = d
      .order
      .as_ref()
      .ok_or_else(|| CheckoutError::Service(CONFIRM_FAILED_MESSAGE.to_string()))?;
    let order_id = order.numeric_id().ok_or_else(|| {
      CheckoutError::Service(format!("Order {} has a non-numeric id '{}'", order.order_number, order.id))
    })?;
    Ok::<_, CheckoutError>((
      d.orders.clone(),
      UpdateOrderStatusRequest {
        order_id,
        status: OrderStatus::Confirmed,
        notes: Some(d.note.clone()),
      },
    ))
  })?;

  let order_id = request.order_id;
  let result = orders.update_order_status(request).await?;
  if !result.success {
    return Err(CheckoutError::Service(
      result.message.filter(|m| !m.is_empty()).unwrap_or_else(|| CONFIRM_FAILED_MESSAGE.to_string()),
    ));
  }
  info!(order_id, "Order confirmed.");
  Ok(StepControl::Continue)
}
