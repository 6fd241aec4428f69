// cacao_checkout/src/model/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an order as reported by the backend.
///
/// Strings the backend adds later are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
  Other(String),
}

impl OrderStatus {
  pub fn as_str(&self) -> &str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Confirmed => "CONFIRMED",
      OrderStatus::Processing => "PROCESSING",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Delivered => "DELIVERED",
      OrderStatus::Cancelled => "CANCELLED",
      OrderStatus::Other(raw) => raw,
    }
  }

  pub fn is_pending(&self) -> bool {
    matches!(self, OrderStatus::Pending)
  }
}

impl From<String> for OrderStatus {
  fn from(raw: String) -> Self {
    match raw.as_str() {
      "PENDING" => OrderStatus::Pending,
      "CONFIRMED" => OrderStatus::Confirmed,
      "PROCESSING" => OrderStatus::Processing,
      "SHIPPED" => OrderStatus::Shipped,
      "DELIVERED" => OrderStatus::Delivered,
      "CANCELLED" => OrderStatus::Cancelled,
      _ => OrderStatus::Other(raw),
    }
  }
}

impl From<OrderStatus> for String {
  fn from(status: OrderStatus) -> Self {
    status.as_str().to_string()
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
  pub product_name: String,
  pub quantity: u32,
  pub unit_price: Decimal,
  pub total_price: Decimal,
  #[serde(default)]
  pub product_sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
  pub status: OrderStatus,
  #[serde(default)]
  pub notes: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

/// An order as the backend reports it. Amounts here are authoritative; the client never
/// recomputes them from the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  /// Backend primary key. Numeric, but carried as a string on the wire.
  pub id: String,
  pub order_number: String,
  pub status: OrderStatus,
  #[serde(default)]
  pub subtotal: Option<Decimal>,
  #[serde(default)]
  pub tax_amount: Option<Decimal>,
  #[serde(default)]
  pub delivery_fee: Option<Decimal>,
  #[serde(default)]
  pub total_amount: Option<Decimal>,
  #[serde(default)]
  pub customer_name: Option<String>,
  #[serde(default)]
  pub customer_email: Option<String>,
  #[serde(default)]
  pub items: Vec<OrderLineItem>,
  #[serde(default)]
  pub status_history: Vec<StatusHistoryEntry>,
}

impl Order {
  /// The numeric id `updateOrderStatus` expects, if the backend id is numeric.
  pub fn numeric_id(&self) -> Option<i64> {
    self.id.trim().parse().ok()
  }
}
