// cacao_checkout/src/error.rs
use thiserror::Error;

/// User-facing text for transport failures. The underlying error is logged, never shown.
pub const NETWORK_ERROR_MESSAGE: &str = "A network error occurred. Please check your connection and try again.";

/// User-facing text for mutations the backend rejected for lack of staff permissions.
pub const AUTHORIZATION_ERROR_MESSAGE: &str =
  "Not authorized: The backend has rejected this request. Please ensure your account has staff/admin permissions and try again.";

/// User-facing text when no payment record exists for the id we were handed.
pub const PAYMENT_NOT_FOUND_MESSAGE: &str =
  "We couldn't find your payment. Please contact support if you've been charged.";

/// Failures of the step-pipeline engine itself, independent of what the steps do.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

/// Everything that can end a checkout attempt.
///
/// The GraphQL boundary classifies remote failures into these variants exactly once;
/// nothing downstream inspects raw message text to decide what kind of failure it was.
#[derive(Debug, Error)]
pub enum CheckoutError {
  /// Local precondition failure. No network call was made.
  #[error("Validation error: {0}")]
  Validation(String),

  /// The backend answered with an explicit failure payload. Message is passed through.
  #[error("Service error: {0}")]
  Service(String),

  /// Transport-level failure (connection, TLS, malformed HTTP).
  #[error("Network error: {0}")]
  Network(String),

  /// The payment (or order) looked up does not exist.
  #[error("Not found: {0}")]
  NotFound(String),

  /// The backend rejected a staff-only mutation.
  #[error("Authorization error: {0}")]
  Authorization(String),

  /// Reading or writing the local session store failed.
  #[error("Session storage error: {0}")]
  Session(String),

  #[error("Checkout flow error: {source}")]
  Flow {
    #[from]
    source: FlowError,
  },
}

impl CheckoutError {
  /// The message a shopper should see for this error.
  pub fn user_message(&self) -> String {
    match self {
      CheckoutError::Validation(m) | CheckoutError::Service(m) => m.clone(),
      CheckoutError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
      CheckoutError::NotFound(_) => PAYMENT_NOT_FOUND_MESSAGE.to_string(),
      CheckoutError::Authorization(_) => AUTHORIZATION_ERROR_MESSAGE.to_string(),
      CheckoutError::Session(_) | CheckoutError::Flow { .. } => {
        "An error occurred during payment processing".to_string()
      }
    }
  }

  /// True for errors raised before any remote call.
  pub fn is_local(&self) -> bool {
    matches!(self, CheckoutError::Validation(_))
  }
}

pub type Result<T, E = CheckoutError> = std::result::Result<T, E>;
