// storefront/src/state.rs
use cacao_checkout::checkout::CheckoutPipelines;
use cacao_checkout::{CheckoutCoordinator, CheckoutSettings, GraphQlBackend, GraphQlClient, SessionContext, SessionStore};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::watches::WatchRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub graphql: GraphQlClient,
  pub sessions: Arc<dyn SessionStore>,
  pub pipelines: CheckoutPipelines,
  pub settings: CheckoutSettings,
  pub watches: Arc<WatchRegistry>,
}

impl AppState {
  pub fn new(config: Arc<AppConfig>, sessions: Arc<dyn SessionStore>) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| AppError::Config(format!("Could not build HTTP client: {}", e)))?;
    let graphql = GraphQlClient::with_http_client(http, config.graphql_api_url.clone())
      .with_csrf_token(config.csrf_token.clone());
    let settings = config.to_checkout_settings();
    Ok(Self {
      config,
      graphql,
      sessions,
      pipelines: CheckoutPipelines::default(),
      settings,
      watches: Arc::new(WatchRegistry::default()),
    })
  }

  pub fn session(&self, session_key: &str) -> SessionContext {
    SessionContext::new(self.sessions.clone(), session_key)
  }

  /// Backend client for one shopper. Carries the stored bearer token when there is one.
  pub async fn backend_for(&self, session: &SessionContext) -> Arc<GraphQlBackend> {
    let token = session.auth_token().await.unwrap_or_else(|e| {
      tracing::warn!(error = %e, "Could not read stored auth token; continuing anonymously.");
      None
    });
    Arc::new(GraphQlBackend::new(self.graphql.with_bearer(token)))
  }

  pub async fn coordinator_for(&self, session_key: &str) -> CheckoutCoordinator {
    let session = self.session(session_key);
    let backend = self.backend_for(&session).await;
    CheckoutCoordinator::with_pipelines(
      backend.clone(),
      backend,
      session,
      self.settings.clone(),
      self.pipelines.clone(),
    )
  }
}
