// cacao_checkout/src/checkout/validation.rs

use serde::Deserialize;
use std::str::FromStr;

use crate::error::{CheckoutError, Result};
use crate::model::{Cart, CustomerInfo, ShippingAddress};

pub const MISSING_FIELDS_MESSAGE: &str =
  "Please fill in all required shipping information (Name, Email, Phone, Address)";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty";
pub const GATEWAY_UNAVAILABLE_MESSAGE: &str = "This payment method is not yet available. Please use Ziina for now.";

/// Payment method picked on the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
  Ziina,
  Other(String),
}

impl PaymentMethod {
  pub fn is_enabled(&self) -> bool {
    matches!(self, PaymentMethod::Ziina)
  }
}

impl FromStr for PaymentMethod {
  type Err = std::convert::Infallible;

  fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
    if raw.trim().eq_ignore_ascii_case("ziina") {
      Ok(PaymentMethod::Ziina)
    } else {
      Ok(PaymentMethod::Other(raw.trim().to_string()))
    }
  }
}

fn default_city() -> String {
  "Dubai".to_string()
}

fn default_emirate() -> String {
  "DUBAI".to_string()
}

/// Shipping form as submitted by the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
  #[serde(default)]
  pub full_name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone_number: String,
  #[serde(default)]
  pub address_line: String,
  #[serde(default)]
  pub address_line2: Option<String>,
  #[serde(default = "default_city")]
  pub city: String,
  #[serde(default = "default_emirate")]
  pub emirate: String,
  #[serde(default)]
  pub postal_code: Option<String>,
}

impl CheckoutForm {
  pub fn customer_info(&self) -> CustomerInfo {
    CustomerInfo {
      name: self.full_name.trim().to_string(),
      email: self.email.trim().to_string(),
      phone: self.phone_number.trim().to_string(),
    }
  }

  pub fn shipping_address(&self) -> ShippingAddress {
    ShippingAddress {
      full_name: self.full_name.trim().to_string(),
      phone_number: self.phone_number.trim().to_string(),
      email: self.email.trim().to_string(),
      address_line1: self.address_line.trim().to_string(),
      address_line2: non_blank(&self.address_line2),
      city: self.city.trim().to_string(),
      emirate: self.emirate.trim().to_string(),
      postal_code: non_blank(&self.postal_code),
    }
  }
}

fn non_blank(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_string)
}

/// Same acceptance as `^[^\s@]+@[^\s@]+\.[^\s@]+$`: one `@`, no whitespace, and a dot
/// in the domain with something on both sides.
pub fn is_valid_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  if local.is_empty() || domain.contains('@') {
    return false;
  }
  domain
    .char_indices()
    .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Checks everything that must hold before any remote call is made.
///
/// Order of checks decides which message the shopper sees first.
pub fn validate_submission(form: &CheckoutForm, cart: &Cart, method: &PaymentMethod) -> Result<()> {
  let required = [&form.full_name, &form.email, &form.phone_number, &form.address_line];
  if required.iter().any(|field| field.trim().is_empty()) {
    return Err(CheckoutError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
  }
  if !is_valid_email(form.email.trim()) {
    return Err(CheckoutError::Validation(INVALID_EMAIL_MESSAGE.to_string()));
  }
  if cart.is_empty() {
    return Err(CheckoutError::Validation(EMPTY_CART_MESSAGE.to_string()));
  }
  if !method.is_enabled() {
    return Err(CheckoutError::Validation(GATEWAY_UNAVAILABLE_MESSAGE.to_string()));
  }
  Ok(())
}
