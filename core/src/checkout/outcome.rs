// cacao_checkout/src/checkout/outcome.rs

//! What a return route shows for a given payment record.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::PAYMENT_NOT_FOUND_MESSAGE;
use crate::model::{Payment, PaymentStatus};

pub const DEFAULT_GATEWAY_LABEL: &str = "Ziina";

/// Navigation offered next to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewAction {
  /// Back to the storefront.
  ContinueShopping,
  /// Back to the cart to pay again.
  TryAgain,
  /// Back to the cart.
  ReturnToCart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaymentView {
  Verifying,
  #[serde(rename_all = "camelCase")]
  Pending { payment_id: String },
  #[serde(rename_all = "camelCase")]
  Success {
    payment_id: String,
    order_number: Option<String>,
    amount: Decimal,
    currency: String,
    gateway_name: String,
    customer_name: Option<String>,
  },
  #[serde(rename_all = "camelCase")]
  Failed {
    payment_id: Option<String>,
    order_number: Option<String>,
  },
  /// A status string we have no rule for, shown verbatim.
  Unknown { status: String },
  NotFound,
  #[serde(rename_all = "camelCase")]
  Cancelled {
    payment_id: Option<String>,
    order_number: Option<String>,
  },
  Error { message: String },
}

impl PaymentView {
  pub fn actions(&self) -> Vec<ViewAction> {
    match self {
      PaymentView::Verifying | PaymentView::Pending { .. } => vec![],
      PaymentView::Success { .. } | PaymentView::Unknown { .. } | PaymentView::NotFound => {
        vec![ViewAction::ContinueShopping]
      }
      PaymentView::Failed { .. } => vec![ViewAction::TryAgain, ViewAction::ContinueShopping],
      PaymentView::Cancelled { .. } => vec![ViewAction::ReturnToCart, ViewAction::ContinueShopping],
      PaymentView::Error { .. } => vec![ViewAction::ReturnToCart],
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      PaymentView::Verifying => "Verifying payment...",
      PaymentView::Pending { .. } => "Payment Processing",
      PaymentView::Success { .. } => "Payment Successful!",
      PaymentView::Failed { .. } => "Payment Failed",
      PaymentView::Unknown { .. } => "Unknown Payment Status",
      PaymentView::NotFound => "Payment Not Found",
      PaymentView::Cancelled { .. } => "Payment Cancelled",
      PaymentView::Error { .. } => "Error Verifying Payment",
    }
  }

  pub fn message(&self) -> String {
    match self {
      PaymentView::Verifying => "Please wait while we confirm your payment.".to_string(),
      PaymentView::Pending { .. } => "Your payment is being processed. Please wait...".to_string(),
      PaymentView::Success { .. } => "Thank you for your order. A confirmation email will be sent shortly.".to_string(),
      PaymentView::Failed { .. } => "Your payment could not be processed. Please try again.".to_string(),
      PaymentView::Unknown { status } => format!("Payment status: {}", status),
      PaymentView::NotFound => PAYMENT_NOT_FOUND_MESSAGE.to_string(),
      PaymentView::Cancelled { order_number: Some(_), .. } => {
        "Your order is still pending. You can complete payment from your cart.".to_string()
      }
      PaymentView::Cancelled { .. } => "You cancelled the payment. No charges were made.".to_string(),
      PaymentView::Error { message } => message.clone(),
    }
  }
}

/// Maps a payment record to the success route's view. Pure; never mutates anything.
pub fn interpret_payment(payment: &Payment) -> PaymentView {
  match &payment.status {
    status if status.is_success() => PaymentView::Success {
      payment_id: payment.payment_id.clone(),
      order_number: payment.order_number().map(str::to_string),
      amount: payment.amount,
      currency: payment.currency.clone(),
      gateway_name: payment
        .gateway
        .as_ref()
        .map(|g| g.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_GATEWAY_LABEL.to_string()),
      customer_name: payment.order.as_ref().and_then(|o| o.customer_name.clone()),
    },
    PaymentStatus::Failed => PaymentView::Failed {
      payment_id: Some(payment.payment_id.clone()),
      order_number: payment.order_number().map(str::to_string),
    },
    PaymentStatus::Pending => PaymentView::Pending {
      payment_id: payment.payment_id.clone(),
    },
    other => PaymentView::Unknown {
      status: other.as_str().to_string(),
    },
  }
}
