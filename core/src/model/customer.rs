// cacao_checkout/src/model/customer.rs

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInfo {
  pub name: String,
  pub email: String,
  pub phone: String,
}

/// Shipping address as `createRetailOrder` expects it. Missing optional parts go over
/// the wire as empty strings, never as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub full_name: String,
  pub phone_number: String,
  pub email: String,
  pub address_line1: String,
  #[serde(serialize_with = "empty_if_none")]
  pub address_line2: Option<String>,
  pub city: String,
  pub emirate: String,
  #[serde(serialize_with = "empty_if_none")]
  pub postal_code: Option<String>,
}

fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(value.as_deref().unwrap_or(""))
}
