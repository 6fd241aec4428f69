// cacao_checkout/src/checkout/submission.rs

//! The submission pipeline: validate, create the order, open a gateway session,
//! remember the payment, hand back the redirect.

use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::checkout::settings::CheckoutSettings;
use crate::checkout::state::{CheckoutState, SharedState};
use crate::checkout::validation::{validate_submission, CheckoutForm, PaymentMethod};
use crate::error::{CheckoutError, Result};
use crate::flow::{FlowData, StepControl};
use crate::model::{Cart, Order};
use crate::pipeline::Pipeline;
use crate::ports::{CreateOrderRequest, OrderService, PaymentGatewayClient, PaymentLineItem, PaymentSessionRequest};
use crate::session::SessionContext;

pub const ORDER_FAILED_MESSAGE: &str = "Failed to create order";
pub const SESSION_FAILED_MESSAGE: &str = "Failed to create payment session";

pub const SUBMISSION_STEPS: &[(&str, bool)] = &[
  ("validate_submission", false),
  ("create_order", false),
  ("create_payment_session", false),
  ("persist_payment_reference", false),
  ("prepare_redirect", false),
];

/// Where to send the shopper once their payment session is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRedirect {
  pub redirect_url: String,
  pub order_number: String,
  pub payment_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedSession {
  pub payment_id: String,
  pub payment_url: String,
}

/// Data threaded through one run of the submission pipeline.
pub struct SubmissionData {
  pub session: SessionContext,
  pub orders: Arc<dyn OrderService>,
  pub payments: Arc<dyn PaymentGatewayClient>,
  pub settings: CheckoutSettings,
  pub form: CheckoutForm,
  pub cart: Cart,
  pub method: PaymentMethod,
  /// Starts in `OrderCreating`, claimed by the caller before the run.
  pub state: SharedState,
  pub order: Option<Order>,
  pub opened_session: Option<OpenedSession>,
  pub redirect: Option<CheckoutRedirect>,
}

/// Builds the `createPaymentSession` input from the order the backend created.
///
/// Totals come from the order, so whatever tax and delivery the backend applied is what
/// the gateway charges.
pub fn build_payment_session_request(
  order: &Order,
  form: &CheckoutForm,
  settings: &CheckoutSettings,
) -> Result<PaymentSessionRequest> {
  let amount = order.total_amount.ok_or_else(|| {
    CheckoutError::Service(format!("Order {} was returned without a total amount", order.order_number))
  })?;
  let customer = form.customer_info();

  Ok(PaymentSessionRequest {
    order_id: order.order_number.clone(),
    amount,
    currency: settings.currency.clone(),
    customer_email: customer.email,
    customer_phone: customer.phone,
    customer_name: customer.name,
    tax_amount: order.tax_amount.unwrap_or(dec!(0.00)),
    shipping_amount: order.delivery_fee.unwrap_or(dec!(0.00)),
    discount_amount: dec!(0.00),
    items: order
      .items
      .iter()
      .map(|item| PaymentLineItem {
        name: item.product_name.clone(),
        price: item.unit_price,
        quantity: item.quantity,
        sku: item.product_sku.clone().unwrap_or_default(),
      })
      .collect(),
    shipping_address: form.shipping_address(),
  })
}

pub fn build_submission_pipeline() -> Pipeline<SubmissionData, CheckoutError> {
  let mut p = Pipeline::new("checkout_submission", SUBMISSION_STEPS);

  p.on("validate_submission", validate_step);

  p.on("create_order", create_order_step);
  p.after("create_order", |data: FlowData<SubmissionData>| async move {
    data.with(|d| d.state.advance(CheckoutState::OrderCreated))?;
    Ok::<_, CheckoutError>(StepControl::Continue)
  });

  p.before("create_payment_session", |data: FlowData<SubmissionData>| async move {
    data.with(|d| d.state.advance(CheckoutState::PaymentSessionCreating))?;
    Ok::<_, CheckoutError>(StepControl::Continue)
  });
  p.on("create_payment_session", create_payment_session_step);

  p.on("persist_payment_reference", persist_payment_reference_step);
  p.on("prepare_redirect", prepare_redirect_step);
  p
}

async fn validate_step(data: FlowData<SubmissionData>) -> Result<StepControl> {
  data.with(|d| validate_submission(&d.form, &d.cart, &d.method))?;
  Ok(StepControl::Continue)
}

#[instrument(name = "submission::create_order", skip_all)]
async fn create_order_step(data: FlowData<SubmissionData>) -> Result<StepControl> {
  let (orders, request) = data.with(|d| {
    (
      d.orders.clone(),
      CreateOrderRequest {
        session_key: d.session.session_key().to_string(),
        customer_info: d.form.customer_info(),
        shipping_address: d.form.shipping_address(),
      },
    )
  });

  let result = orders.create_order(request).await?;
  let order = match (result.success, result.order) {
    (true, Some(order)) => order,
    _ => {
      let message = result.message.filter(|m| !m.is_empty()).unwrap_or_else(|| ORDER_FAILED_MESSAGE.to_string());
      error!(%message, "Order creation rejected by backend.");
      return Err(CheckoutError::Service(message));
    }
  };

  info!(order_number = %order.order_number, total = ?order.total_amount, "Order created.");
  data.update(|d| d.order = Some(order));
  Ok(StepControl::Continue)
}

#[instrument(name = "submission::create_payment_session", skip_all)]
async fn create_payment_session_step(data: FlowData<SubmissionData>) -> Result<StepControl> {
  let (payments, request, gateway_name) = data.with(|d| {
    let order = d
      .order
      .as_ref()
      .ok_or_else(|| CheckoutError::Service(ORDER_FAILED_MESSAGE.to_string()))?;
    let request = build_payment_session_request(order, &d.form, &d.settings)?;
    Ok::<_, CheckoutError>((d.payments.clone(), request, d.settings.gateway_name.clone()))
  })?;

  let session = payments.create_session(request, &gateway_name).await?;
  let opened = match (session.success, session.payment_id, session.payment_url) {
    (true, Some(payment_id), Some(payment_url)) if !payment_id.is_empty() && !payment_url.is_empty() => OpenedSession {
      payment_id,
      payment_url,
    },
    _ => {
      let message = session
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| SESSION_FAILED_MESSAGE.to_string());
      error!(%message, gateway = %gateway_name, "Payment session rejected.");
      return Err(CheckoutError::Service(message));
    }
  };

  info!(payment_id = %opened.payment_id, gateway = %gateway_name, "Payment session opened.");
  data.update(|d| d.opened_session = Some(opened));
  Ok(StepControl::Continue)
}

async fn persist_payment_reference_step(data: FlowData<SubmissionData>) -> Result<StepControl> {
  let (session, payment_id, order_number) = data.with(|d| match (&d.opened_session, &d.order) {
    (Some(opened), Some(order)) => Ok((d.session.clone(), opened.payment_id.clone(), order.order_number.clone())),
    _ => Err(CheckoutError::Service(SESSION_FAILED_MESSAGE.to_string())),
  })?;
  session.save_payment_reference(&payment_id, &order_number).await?;
  Ok(StepControl::Continue)
}

async fn prepare_redirect_step(data: FlowData<SubmissionData>) -> Result<StepControl> {
  data.update(|d| {
    let redirect = match (&d.opened_session, &d.order) {
      (Some(opened), Some(order)) => CheckoutRedirect {
        redirect_url: opened.payment_url.clone(),
        order_number: order.order_number.clone(),
        payment_id: opened.payment_id.clone(),
      },
      _ => return Err(CheckoutError::Service(SESSION_FAILED_MESSAGE.to_string())),
    };
    d.state.advance(CheckoutState::Redirecting)?;
    d.redirect = Some(redirect);
    Ok(())
  })?;
  Ok(StepControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{OrderLineItem, OrderStatus};

  fn order() -> Order {
    Order {
      id: "7".to_string(),
      order_number: "ORD-7".to_string(),
      status: OrderStatus::Pending,
      subtotal: Some(dec!(100.00)),
      tax_amount: Some(dec!(5.00)),
      delivery_fee: Some(dec!(10.00)),
      total_amount: Some(dec!(115.00)),
      customer_name: None,
      customer_email: None,
      items: vec![OrderLineItem {
        product_name: "Hazelnut Bar".to_string(),
        quantity: 4,
        unit_price: dec!(25.00),
        total_price: dec!(100.00),
        product_sku: None,
      }],
      status_history: vec![],
    }
  }

  fn form() -> CheckoutForm {
    serde_json::from_value(serde_json::json!({
      "fullName": "Noor Al Amiri",
      "email": "noor@example.ae",
      "phoneNumber": "+971555555555",
      "addressLine": "Tower B, 14th floor"
    }))
    .unwrap()
  }

  #[test]
  fn session_amounts_come_from_the_order() {
    let request = build_payment_session_request(&order(), &form(), &CheckoutSettings::default()).unwrap();
    assert_eq!(request.order_id, "ORD-7");
    assert_eq!(request.amount, dec!(115.00));
    assert_eq!(request.tax_amount, dec!(5.00));
    assert_eq!(request.shipping_amount, dec!(10.00));
    assert_eq!(request.currency, "AED");
    assert_eq!(request.items[0].sku, "");

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["amount"], "115.00");
    assert_eq!(json["discountAmount"], "0.00");
    assert_eq!(json["shippingAddress"]["city"], "Dubai");
  }

  #[test]
  fn missing_tax_and_delivery_default_to_zero() {
    let mut order = order();
    order.tax_amount = None;
    order.delivery_fee = None;
    let request = build_payment_session_request(&order, &form(), &CheckoutSettings::default()).unwrap();
    assert_eq!(serde_json::to_value(request.tax_amount).unwrap(), "0.00");
    assert_eq!(serde_json::to_value(request.shipping_amount).unwrap(), "0.00");
  }
}
