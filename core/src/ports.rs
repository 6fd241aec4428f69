// cacao_checkout/src/ports.rs

//! The remote collaborators the checkout flow talks to, and the messages it exchanges
//! with them. `graphql::GraphQlBackend` implements all three traits; tests use fakes.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Cart, CustomerInfo, Order, OrderStatus, Payment, PaymentStatus, ShippingAddress};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
  pub session_key: String,
  pub customer_info: CustomerInfo,
  pub shipping_address: ShippingAddress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentLineItem {
  pub name: String,
  pub price: Decimal,
  pub quantity: u32,
  pub sku: String,
}

/// Input of `createPaymentSession`. Amounts come from the created order, not the cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
  /// The order number, which the gateway echoes back as its reference.
  pub order_id: String,
  pub amount: Decimal,
  pub currency: String,
  pub customer_email: String,
  pub customer_phone: String,
  pub customer_name: String,
  pub tax_amount: Decimal,
  pub shipping_amount: Decimal,
  pub discount_amount: Decimal,
  pub items: Vec<PaymentLineItem>,
  pub shipping_address: ShippingAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
  pub payment_id: String,
  pub gateway_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
  pub order_id: i64,
  pub status: OrderStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

/// Envelope of the order mutations (`createRetailOrder`, `updateOrderStatus`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderMutationResult {
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub order: Option<Order>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub payment_url: Option<String>,
  #[serde(default)]
  pub payment_id: Option<String>,
  #[serde(default)]
  pub expires_at: Option<String>,
  #[serde(default)]
  pub gateway_response: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub amount: Option<Decimal>,
  #[serde(default)]
  pub transaction_id: Option<String>,
  #[serde(default)]
  pub gateway_response: serde_json::Value,
}

impl PaymentVerification {
  /// Whether the gateway reported a settled payment. Compared case-insensitively, since
  /// verification echoes the gateway's own casing.
  pub fn reports_settled(&self) -> bool {
    self.success
      && self
        .status
        .as_deref()
        .map(|s| {
          let status = PaymentStatus::from(s.to_ascii_uppercase());
          matches!(status, PaymentStatus::Completed | PaymentStatus::Captured)
        })
        .unwrap_or(false)
  }
}

#[async_trait]
pub trait OrderService: Send + Sync {
  async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderMutationResult>;
  async fn order(&self, order_number: &str) -> Result<Option<Order>>;
  async fn update_order_status(&self, request: UpdateOrderStatusRequest) -> Result<OrderMutationResult>;
}

#[async_trait]
pub trait PaymentGatewayClient: Send + Sync {
  async fn create_session(&self, request: PaymentSessionRequest, gateway_name: &str) -> Result<PaymentSession>;
  async fn verify(&self, request: VerifyPaymentRequest) -> Result<PaymentVerification>;
  async fn payment(&self, payment_id: &str) -> Result<Option<Payment>>;
}

#[async_trait]
pub trait CartService: Send + Sync {
  async fn cart(&self, session_key: &str) -> Result<Option<Cart>>;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn verification(success: bool, status: Option<&str>) -> PaymentVerification {
    PaymentVerification {
      success,
      message: None,
      status: status.map(str::to_string),
      amount: None,
      transaction_id: None,
      gateway_response: serde_json::Value::Null,
    }
  }

  #[test]
  fn settled_verification_ignores_case() {
    assert!(verification(true, Some("completed")).reports_settled());
    assert!(verification(true, Some("CAPTURED")).reports_settled());
    assert!(!verification(true, Some("authorized")).reports_settled());
    assert!(!verification(false, Some("completed")).reports_settled());
    assert!(!verification(true, None).reports_settled());
  }

  #[test]
  fn update_status_request_uses_integer_order_id() {
    let request = UpdateOrderStatusRequest {
      order_id: 42,
      status: OrderStatus::Confirmed,
      notes: Some("note".to_string()),
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["orderId"], 42);
    assert_eq!(json["status"], "CONFIRMED");
  }
}
