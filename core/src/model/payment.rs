// cacao_checkout/src/model/payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::order::OrderStatus;

/// Payment status reported by the backend after talking to the gateway.
///
/// Matching is exact on the upper-case wire value; anything else lands in `Unknown`
/// with the raw string intact so it can be shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
  Pending,
  Completed,
  Captured,
  Authorized,
  Failed,
  Unknown(String),
}

impl PaymentStatus {
  pub fn as_str(&self) -> &str {
    match self {
      PaymentStatus::Pending => "PENDING",
      PaymentStatus::Completed => "COMPLETED",
      PaymentStatus::Captured => "CAPTURED",
      PaymentStatus::Authorized => "AUTHORIZED",
      PaymentStatus::Failed => "FAILED",
      PaymentStatus::Unknown(raw) => raw,
    }
  }

  /// COMPLETED, CAPTURED and AUTHORIZED all mean the shopper has paid.
  pub fn is_success(&self) -> bool {
    matches!(
      self,
      PaymentStatus::Completed | PaymentStatus::Captured | PaymentStatus::Authorized
    )
  }
}

impl From<String> for PaymentStatus {
  fn from(raw: String) -> Self {
    match raw.as_str() {
      "PENDING" => PaymentStatus::Pending,
      "COMPLETED" => PaymentStatus::Completed,
      "CAPTURED" => PaymentStatus::Captured,
      "AUTHORIZED" => PaymentStatus::Authorized,
      "FAILED" => PaymentStatus::Failed,
      _ => PaymentStatus::Unknown(raw),
    }
  }
}

impl From<&str> for PaymentStatus {
  fn from(raw: &str) -> Self {
    PaymentStatus::from(raw.to_string())
  }
}

impl From<PaymentStatus> for String {
  fn from(status: PaymentStatus) -> Self {
    status.as_str().to_string()
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The slice of the linked order embedded in a payment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderSummary {
  #[serde(default)]
  pub order_number: Option<String>,
  pub status: OrderStatus,
  #[serde(default)]
  pub customer_name: Option<String>,
  #[serde(default)]
  pub total_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentGateway {
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
  pub id: String,
  pub payment_id: String,
  pub status: PaymentStatus,
  pub amount: Decimal,
  pub currency: String,
  #[serde(default)]
  pub order: Option<PaymentOrderSummary>,
  #[serde(default)]
  pub gateway: Option<PaymentGateway>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub captured_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub gateway_transaction_id: Option<String>,
  /// Opaque gateway payload, passed through untouched.
  #[serde(default)]
  pub gateway_response: serde_json::Value,
}

impl Payment {
  pub fn order_number(&self) -> Option<&str> {
    self.order.as_ref().and_then(|o| o.order_number.as_deref())
  }
}
