// storefront/src/web/session.rs

use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponseBuilder};
use cacao_checkout::session::{generate_session_key, SESSION_KEY_PREFIX};
use futures_util::future::{ready, Ready};
use std::convert::Infallible;

pub const SESSION_COOKIE: &str = "cart_session_key";
pub const SESSION_HEADER: &str = "X-Cart-Session";

/// The shopper's cart session key, taken from the cookie or header, or freshly generated.
#[derive(Debug, Clone)]
pub struct CartSession {
  pub key: String,
  pub is_new: bool,
}

impl CartSession {
  /// Sets the session cookie on the response when the key was generated for this request.
  pub fn attach(&self, response: &mut HttpResponseBuilder) {
    if self.is_new {
      response.cookie(
        Cookie::build(SESSION_COOKIE, self.key.clone())
          .path("/")
          .http_only(true)
          .same_site(SameSite::Lax)
          .finish(),
      );
    }
  }
}

fn usable(raw: &str) -> Option<String> {
  let key = raw.trim();
  (key.starts_with(SESSION_KEY_PREFIX) && key.len() > SESSION_KEY_PREFIX.len()).then(|| key.to_string())
}

impl FromRequest for CartSession {
  type Error = Infallible;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let existing = req
      .cookie(SESSION_COOKIE)
      .and_then(|c| usable(c.value()))
      .or_else(|| {
        req
          .headers()
          .get(SESSION_HEADER)
          .and_then(|v| v.to_str().ok())
          .and_then(usable)
      });

    let session = match existing {
      Some(key) => CartSession { key, is_new: false },
      None => {
        let key = generate_session_key();
        tracing::debug!(session_key = %key, "Issued new cart session key.");
        CartSession { key, is_new: true }
      }
    };
    ready(Ok(session))
  }
}
