// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use cacao_checkout::CheckoutError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Checkout(#[from] CheckoutError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Watch not found: {0}")]
  WatchNotFound(String),
}

impl AppError {
  /// The text placed in the JSON error body.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Checkout(e) => e.user_message(),
      AppError::Config(_) => "An internal error occurred".to_string(),
      AppError::WatchNotFound(_) => "This payment page is no longer active.".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Checkout(e) => match e {
        CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
        CheckoutError::Authorization(_) => StatusCode::FORBIDDEN,
        CheckoutError::NotFound(_) => StatusCode::NOT_FOUND,
        CheckoutError::Service(_) => StatusCode::BAD_GATEWAY,
        CheckoutError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
        CheckoutError::Session(_) | CheckoutError::Flow { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::WatchNotFound(_) => StatusCode::NOT_FOUND,
      AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, status = status.as_u16(), "Responding with error");
    } else {
      tracing::info!(application_error = %self, status = status.as_u16(), "Responding with error");
    }
    HttpResponse::build(status).json(json!({ "error": self.public_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
