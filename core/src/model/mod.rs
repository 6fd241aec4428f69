// cacao_checkout/src/model/mod.rs

//! Read models returned by the storefront backend, plus the customer data we send it.

pub mod cart;
pub mod customer;
pub mod order;
pub mod payment;

pub use cart::{Cart, CartItem, CartProduct};
pub use customer::{CustomerInfo, ShippingAddress};
pub use order::{Order, OrderLineItem, OrderStatus, StatusHistoryEntry};
pub use payment::{Payment, PaymentGateway, PaymentOrderSummary, PaymentStatus};
