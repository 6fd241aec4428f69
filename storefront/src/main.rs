// storefront/src/main.rs

mod config;
mod errors;
mod state;
mod watches;
mod web;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::watches::PRUNE_EVERY;

use actix_web::{web as actix_data, App, HttpServer};
use cacao_checkout::{FileSessionStore, SessionStore};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);

  // LOG_FORMAT=json for log shippers; human-readable otherwise.
  if std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false) {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  init_tracing();
  tracing::info!("Starting storefront checkout server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let sessions: Arc<dyn SessionStore> = Arc::new(FileSessionStore::with_max_age(
    app_config.session_store_path.clone(),
    app_config.session_max_age,
  ));
  let app_state = AppState::new(app_config.clone(), sessions)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
  tracing::info!(
    store = %app_state.config.session_store_path,
    endpoint = %app_state.graphql.endpoint(),
    "Checkout pipelines built."
  );

  let watches = app_state.watches.clone();
  actix_web::rt::spawn(async move {
    let mut ticker = actix_web::rt::time::interval(PRUNE_EVERY);
    loop {
      ticker.tick().await;
      let removed = watches.prune();
      if removed > 0 {
        tracing::debug!(removed, remaining = watches.len(), "Pruned payment watches.");
      }
    }
  });

  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
