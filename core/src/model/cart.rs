// cacao_checkout/src/model/cart.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
  #[serde(default)]
  pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub id: String,
  pub quantity: u32,
  pub product_name: String,
  #[serde(default)]
  pub display_name: Option<String>,
  #[serde(default)]
  pub product: Option<CartProduct>,
}

/// Server-side cart for one session key. Pricing here is informational; the order
/// created from it carries the binding totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  pub id: String,
  pub session_key: String,
  #[serde(default)]
  pub subtotal: Decimal,
  #[serde(default)]
  pub tax_amount: Decimal,
  #[serde(default)]
  pub total: Decimal,
  #[serde(default)]
  pub item_count: u32,
  #[serde(default)]
  pub items: Vec<CartItem>,
}

impl Cart {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}
