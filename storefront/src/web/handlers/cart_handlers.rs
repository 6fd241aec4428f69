// storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use cacao_checkout::CartService;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::CartSession;

#[instrument(name = "handler::get_cart", skip(app_state, cart_session), fields(session_key = %cart_session.key))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  cart_session: CartSession,
) -> Result<HttpResponse, AppError> {
  let session = app_state.session(&cart_session.key);
  let cart = app_state.backend_for(&session).await.cart(&cart_session.key).await?;
  info!(found = cart.is_some(), "Cart fetched.");

  let mut response = HttpResponse::Ok();
  cart_session.attach(&mut response);
  Ok(response.json(json!({
    "sessionKey": cart_session.key,
    "cart": cart,
  })))
}
