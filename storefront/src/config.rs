// storefront/src/config.rs

use crate::errors::{AppError, Result};
use cacao_checkout::session::DEFAULT_SESSION_MAX_AGE;
use cacao_checkout::{CheckoutSettings, PollPolicy};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub graphql_api_url: String,
  pub session_store_path: String,
  /// `None` keeps stored sessions forever.
  pub session_max_age: Option<Duration>,
  pub csrf_token: Option<String>,

  pub poll_interval: Duration,
  pub poll_max_attempts: Option<u32>,
  pub poll_max_duration: Option<Duration>,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source. Blank values count as unset.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = get("SERVER_PORT")
      .unwrap_or_else(|| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let graphql_api_url = get("GRAPHQL_API_URL")
      .ok_or_else(|| AppError::Config("Missing environment variable 'GRAPHQL_API_URL'".to_string()))?;
    let session_store_path = get("SESSION_STORE_PATH").unwrap_or_else(|| ".storefront-sessions.json".to_string());
    let session_max_age = match get("SESSION_MAX_AGE_HOURS")
      .map(|v| v.parse::<u64>())
      .transpose()
      .map_err(|e| AppError::Config(format!("Invalid SESSION_MAX_AGE_HOURS: {}", e)))?
    {
      None => Some(DEFAULT_SESSION_MAX_AGE),
      Some(0) => None,
      Some(hours) => Some(Duration::from_secs(hours * 60 * 60)),
    };
    let csrf_token = get("CSRF_TOKEN");

    let poll_interval_ms = get("PAYMENT_POLL_INTERVAL_MS")
      .map(|v| v.parse::<u64>())
      .transpose()
      .map_err(|e| AppError::Config(format!("Invalid PAYMENT_POLL_INTERVAL_MS: {}", e)))?
      .unwrap_or(3000);
    if poll_interval_ms == 0 {
      return Err(AppError::Config("PAYMENT_POLL_INTERVAL_MS must be positive".to_string()));
    }
    let poll_max_attempts = get("PAYMENT_POLL_MAX_ATTEMPTS")
      .map(|v| v.parse::<u32>())
      .transpose()
      .map_err(|e| AppError::Config(format!("Invalid PAYMENT_POLL_MAX_ATTEMPTS: {}", e)))?;
    let poll_max_duration = get("PAYMENT_POLL_MAX_SECONDS")
      .map(|v| v.parse::<u64>())
      .transpose()
      .map_err(|e| AppError::Config(format!("Invalid PAYMENT_POLL_MAX_SECONDS: {}", e)))?
      .map(Duration::from_secs);

    tracing::info!(
      graphql_api_url = %graphql_api_url,
      csrf = csrf_token.is_some(),
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      graphql_api_url,
      session_store_path,
      session_max_age,
      csrf_token,
      poll_interval: Duration::from_millis(poll_interval_ms),
      poll_max_attempts,
      poll_max_duration,
    })
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }

  pub fn to_checkout_settings(&self) -> CheckoutSettings {
    CheckoutSettings {
      poll: PollPolicy {
        interval: self.poll_interval,
        max_attempts: self.poll_max_attempts,
        max_duration: self.poll_max_duration,
      },
      ..CheckoutSettings::default()
    }
  }
}
