// storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use cacao_checkout::ReturnRoute;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::session::CartSession;

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
  pub payment_id: Option<String>,
}

/// The gateway lands the shopper here. Mounts a watch that verifies and (on success) polls the payment.
#[instrument(
  name = "handler::payment_return",
  skip(app_state, query, cart_session),
  fields(route = %route, session_key = %cart_session.key)
)]
pub async fn payment_return_handler(
  app_state: web::Data<AppState>,
  route: web::Path<String>,
  query: web::Query<ReturnQuery>,
  cart_session: CartSession,
) -> Result<HttpResponse, AppError> {
  let route: ReturnRoute = route.parse()?;
  let coordinator = app_state.coordinator_for(&cart_session.key).await;
  let watch = coordinator.mount_return(route, query.payment_id.as_deref()).await;
  let snapshot = watch.snapshot();
  let watch_id = app_state.watches.mount(watch);
  info!(%watch_id, payment_id = ?snapshot.payment_id, "Payment return mounted.");

  let mut response = HttpResponse::Ok();
  cart_session.attach(&mut response);
  Ok(response.json(json!({
    "watchId": watch_id,
    "route": route,
    "snapshot": snapshot,
  })))
}

fn parse_watch_id(raw: &str) -> Result<Uuid, AppError> {
  Uuid::parse_str(raw).map_err(|_| AppError::WatchNotFound(raw.to_string()))
}

pub async fn watch_snapshot_handler(
  app_state: web::Data<AppState>,
  watch_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let id = parse_watch_id(&watch_id)?;
  let snapshot = app_state
    .watches
    .snapshot(&id)
    .ok_or_else(|| AppError::WatchNotFound(id.to_string()))?;
  Ok(HttpResponse::Ok().json(snapshot))
}

#[instrument(name = "handler::unmount_watch", skip(app_state))]
pub async fn unmount_watch_handler(
  app_state: web::Data<AppState>,
  watch_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let id = parse_watch_id(&watch_id)?;
  if !app_state.watches.unmount(&id) {
    return Err(AppError::WatchNotFound(id.to_string()));
  }
  info!(watch_id = %id, "Payment watch unmounted.");
  Ok(HttpResponse::NoContent().finish())
}
