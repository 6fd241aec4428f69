// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use cacao_checkout::checkout::validation::EMPTY_CART_MESSAGE;
use cacao_checkout::{CartService, CheckoutError, CheckoutForm, PaymentMethod};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::CartSession;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequestPayload {
  #[serde(default)]
  pub payment_method: String,
  #[serde(flatten)]
  pub form: CheckoutForm,
}

#[instrument(
  name = "handler::start_checkout",
  skip(app_state, req_payload, cart_session),
  fields(session_key = %cart_session.key, payment_method = %req_payload.payment_method)
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CheckoutRequestPayload>,
  cart_session: CartSession,
) -> Result<HttpResponse, AppError> {
  let CheckoutRequestPayload { payment_method, form } = req_payload.into_inner();
  let method = payment_method
    .parse::<PaymentMethod>()
    .unwrap_or_else(|never| match never {});

  let coordinator = app_state.coordinator_for(&cart_session.key).await;
  let cart = app_state
    .backend_for(coordinator.session())
    .await
    .cart(&cart_session.key)
    .await?
    .ok_or_else(|| CheckoutError::Validation(EMPTY_CART_MESSAGE.to_string()))?;

  let redirect = coordinator.submit(&cart, form, method).await?;
  info!(order_number = %redirect.order_number, "Checkout submitted; handing back gateway URL.");

  let mut response = HttpResponse::Ok();
  cart_session.attach(&mut response);
  Ok(response.json(redirect))
}
