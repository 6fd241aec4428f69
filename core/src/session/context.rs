// cacao_checkout/src/session/context.rs

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::session::store::{SessionStore, StoredSession};

pub const SESSION_KEY_PREFIX: &str = "cart_session_";

/// Builds a new cart session key: `cart_session_<unix millis>_<9 random chars>`.
pub fn generate_session_key() -> String {
  let entropy = Uuid::new_v4().simple().to_string();
  format!("{}{}_{}", SESSION_KEY_PREFIX, Utc::now().timestamp_millis(), &entropy[..9])
}

/// One shopper's view of the session store, bound to their cart session key.
#[derive(Clone)]
pub struct SessionContext {
  store: Arc<dyn SessionStore>,
  session_key: String,
}

impl std::fmt::Debug for SessionContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SessionContext")
      .field("session_key", &self.session_key)
      .finish_non_exhaustive()
  }
}

impl SessionContext {
  pub fn new(store: Arc<dyn SessionStore>, session_key: impl Into<String>) -> Self {
    Self {
      store,
      session_key: session_key.into(),
    }
  }

  pub fn session_key(&self) -> &str {
    &self.session_key
  }

  pub async fn load(&self) -> Result<StoredSession> {
    self.store.load(&self.session_key).await
  }

  pub async fn payment_id(&self) -> Result<Option<String>> {
    Ok(self.load().await?.payment_id)
  }

  pub async fn save_payment_reference(&self, payment_id: &str, order_number: &str) -> Result<()> {
    let mut session = self.load().await?;
    session.payment_id = Some(payment_id.to_string());
    session.order_number = Some(order_number.to_string());
    self.store.store(&self.session_key, session).await?;
    debug!(session_key = %self.session_key, payment_id, order_number, "Payment reference saved.");
    Ok(())
  }

  /// Removes `payment_id` and `order_number`. Returns whether anything was removed.
  pub async fn clear_payment_reference(&self) -> Result<bool> {
    let mut session = self.load().await?;
    let had_reference = session.payment_id.take().is_some() | session.order_number.take().is_some();
    if had_reference {
      self.store.store(&self.session_key, session).await?;
      debug!(session_key = %self.session_key, "Payment reference cleared.");
    }
    Ok(had_reference)
  }

  pub async fn auth_token(&self) -> Result<Option<String>> {
    Ok(self.load().await?.jwt_token)
  }

  pub async fn set_auth_token(&self, token: &str) -> Result<()> {
    let mut session = self.load().await?;
    session.jwt_token = Some(token.to_string());
    self.store.store(&self.session_key, session).await
  }
}
