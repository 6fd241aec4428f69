// cacao_checkout/src/graphql/backend.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use crate::error::{CheckoutError, Result};
use crate::graphql::client::GraphQlClient;
use crate::graphql::documents;
use crate::model::{Cart, Order, Payment};
use crate::ports::{
  CartService, CreateOrderRequest, OrderMutationResult, OrderService, PaymentGatewayClient, PaymentSession,
  PaymentSessionRequest, PaymentVerification, UpdateOrderStatusRequest, VerifyPaymentRequest,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRetailOrderData {
  create_retail_order: OrderMutationResult,
}

#[derive(Deserialize)]
struct OrderData {
  order: Option<Order>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOrderStatusData {
  update_order_status: OrderMutationResult,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentSessionData {
  create_payment_session: PaymentSession,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyPaymentData {
  verify_payment: PaymentVerification,
}

#[derive(Deserialize)]
struct PaymentData {
  payment: Option<Payment>,
}

#[derive(Deserialize)]
struct CartData {
  cart: Option<Cart>,
}

fn to_variables<T: Serialize>(value: &T) -> Result<Value> {
  serde_json::to_value(value).map_err(|e| CheckoutError::Service(format!("Could not encode request: {}", e)))
}

/// The storefront backend reached over GraphQL. One value serves all three ports.
#[derive(Debug, Clone)]
pub struct GraphQlBackend {
  client: GraphQlClient,
}

impl GraphQlBackend {
  pub fn new(client: GraphQlClient) -> Self {
    Self { client }
  }

  pub fn client(&self) -> &GraphQlClient {
    &self.client
  }
}

#[async_trait]
impl OrderService for GraphQlBackend {
  #[instrument(name = "OrderService::create_order", skip_all, fields(session_key = %request.session_key))]
  async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderMutationResult> {
    let data: CreateRetailOrderData = self
      .client
      .execute("CreateRetailOrder", documents::CREATE_RETAIL_ORDER, to_variables(&request)?)
      .await?;
    Ok(data.create_retail_order)
  }

  #[instrument(name = "OrderService::order", skip(self))]
  async fn order(&self, order_number: &str) -> Result<Option<Order>> {
    let data: OrderData = self
      .client
      .execute("GetOrder", documents::GET_ORDER, json!({ "orderNumber": order_number }))
      .await?;
    Ok(data.order)
  }

  #[instrument(name = "OrderService::update_order_status", skip_all, fields(order_id = request.order_id, status = %request.status))]
  async fn update_order_status(&self, request: UpdateOrderStatusRequest) -> Result<OrderMutationResult> {
    let data: UpdateOrderStatusData = self
      .client
      .execute(
        "UpdateOrderStatus",
        documents::UPDATE_ORDER_STATUS,
        json!({ "input": to_variables(&request)? }),
      )
      .await?;
    Ok(data.update_order_status)
  }
}

#[async_trait]
impl PaymentGatewayClient for GraphQlBackend {
  #[instrument(name = "PaymentGatewayClient::create_session", skip(self, request), fields(order_id = %request.order_id, amount = %request.amount))]
  async fn create_session(&self, request: PaymentSessionRequest, gateway_name: &str) -> Result<PaymentSession> {
    let data: CreatePaymentSessionData = self
      .client
      .execute(
        "CreatePaymentSession",
        documents::CREATE_PAYMENT_SESSION,
        json!({ "input": to_variables(&request)?, "gatewayName": gateway_name }),
      )
      .await?;
    Ok(data.create_payment_session)
  }

  #[instrument(name = "PaymentGatewayClient::verify", skip_all, fields(payment_id = %request.payment_id))]
  async fn verify(&self, request: VerifyPaymentRequest) -> Result<PaymentVerification> {
    let data: VerifyPaymentData = self
      .client
      .execute(
        "VerifyPayment",
        documents::VERIFY_PAYMENT,
        json!({ "input": to_variables(&request)? }),
      )
      .await?;
    Ok(data.verify_payment)
  }

  #[instrument(name = "PaymentGatewayClient::payment", skip(self))]
  async fn payment(&self, payment_id: &str) -> Result<Option<Payment>> {
    let data: PaymentData = self
      .client
      .execute("GetPayment", documents::GET_PAYMENT, json!({ "paymentId": payment_id }))
      .await?;
    Ok(data.payment)
  }
}

#[async_trait]
impl CartService for GraphQlBackend {
  #[instrument(name = "CartService::cart", skip(self))]
  async fn cart(&self, session_key: &str) -> Result<Option<Cart>> {
    let data: CartData = self
      .client
      .execute("GetCart", documents::GET_CART, json!({ "sessionKey": session_key }))
      .await?;
    Ok(data.cart)
  }
}
