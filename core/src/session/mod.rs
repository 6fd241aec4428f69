// cacao_checkout/src/session/mod.rs

//! Per-shopper persisted state: the tracked payment, its order number, and the auth
//! token sent with backend calls. Passed explicitly to whoever needs it.

pub mod context;
pub mod store;

pub use context::{generate_session_key, SessionContext, SESSION_KEY_PREFIX};
pub use store::{FileSessionStore, DEFAULT_SESSION_MAX_AGE, MemorySessionStore, SessionStore, StoredSession};
