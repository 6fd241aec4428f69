// cacao_checkout/src/session/store.rs

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{debug, instrument};

use crate::error::{CheckoutError, Result};

/// Everything persisted for one cart session key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order_number: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub jwt_token: Option<String>,
}

impl StoredSession {
  pub fn is_empty(&self) -> bool {
    self.payment_id.is_none() && self.order_number.is_none() && self.jwt_token.is_none()
  }
}

/// Key-value persistence for sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
  /// Returns an empty session when nothing is stored under `session_key`.
  async fn load(&self, session_key: &str) -> Result<StoredSession>;
  /// Replaces the stored session. Storing an empty session removes the entry.
  async fn store(&self, session_key: &str, session: StoredSession) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
  sessions: Mutex<HashMap<String, StoredSession>>,
}

impl MemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.sessions.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.sessions.lock().is_empty()
  }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
  async fn load(&self, session_key: &str) -> Result<StoredSession> {
    Ok(self.sessions.lock().get(session_key).cloned().unwrap_or_default())
  }

  async fn store(&self, session_key: &str, session: StoredSession) -> Result<()> {
    let mut sessions = self.sessions.lock();
    if session.is_empty() {
      sessions.remove(session_key);
    } else {
      sessions.insert(session_key.to_string(), session);
    }
    Ok(())
  }
}

/// Entries untouched for this long are dropped from the session file.
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry {
  #[serde(flatten)]
  session: StoredSession,
  #[serde(default = "Utc::now")]
  updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct SessionFile {
  path: PathBuf,
  max_age: Option<ChronoDuration>,
  // Serializes read-modify-write cycles on the file.
  lock: Mutex<()>,
}

/// Sessions kept in one JSON file, so a tracked payment survives a process restart.
///
/// File I/O runs on tokio's blocking pool. Entries older than the max age are ignored
/// on load and dropped on the next write.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
  file: Arc<SessionFile>,
}

impl FileSessionStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self::with_max_age(path, Some(DEFAULT_SESSION_MAX_AGE))
  }

  /// `None` keeps entries until they are cleared.
  pub fn with_max_age(path: impl Into<PathBuf>, max_age: Option<Duration>) -> Self {
    Self {
      file: Arc::new(SessionFile {
        path: path.into(),
        max_age: max_age.and_then(|age| ChronoDuration::from_std(age).ok()),
        lock: Mutex::new(()),
      }),
    }
  }

  pub fn path(&self) -> &Path {
    &self.file.path
  }

  async fn blocking<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&SessionFile) -> Result<T> + Send + 'static,
  {
    let file = self.file.clone();
    task::spawn_blocking(move || op(&file))
      .await
      .map_err(|e| CheckoutError::Session(format!("session file task failed: {}", e)))?
  }
}

impl SessionFile {
  fn is_fresh(&self, entry: &FileEntry, now: DateTime<Utc>) -> bool {
    self.max_age.map_or(true, |max| now - entry.updated_at < max)
  }

  fn read_all(&self) -> Result<HashMap<String, FileEntry>> {
    match fs::read_to_string(&self.path) {
      Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
      Ok(raw) => serde_json::from_str(&raw)
        .map_err(|e| CheckoutError::Session(format!("corrupt session file {}: {}", self.path.display(), e))),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
      Err(e) => Err(CheckoutError::Session(format!(
        "failed to read {}: {}",
        self.path.display(),
        e
      ))),
    }
  }

  fn write_all(&self, entries: &HashMap<String, FileEntry>) -> Result<()> {
    let raw = serde_json::to_string_pretty(entries)
      .map_err(|e| CheckoutError::Session(format!("failed to encode sessions: {}", e)))?;
    fs::write(&self.path, raw)
      .map_err(|e| CheckoutError::Session(format!("failed to write {}: {}", self.path.display(), e)))
  }

  fn load(&self, session_key: &str) -> Result<StoredSession> {
    let _guard = self.lock.lock();
    let now = Utc::now();
    Ok(
      self
        .read_all()?
        .remove(session_key)
        .filter(|entry| self.is_fresh(entry, now))
        .map(|entry| entry.session)
        .unwrap_or_default(),
    )
  }

  fn store(&self, session_key: &str, session: StoredSession) -> Result<()> {
    let _guard = self.lock.lock();
    let now = Utc::now();
    let mut entries = self.read_all()?;
    let before = entries.len();
    entries.retain(|_, entry| self.is_fresh(entry, now));
    let expired = before - entries.len();

    if session.is_empty() {
      entries.remove(session_key);
    } else {
      entries.insert(
        session_key.to_string(),
        FileEntry {
          session,
          updated_at: now,
        },
      );
    }
    self.write_all(&entries)?;
    debug!(sessions = entries.len(), expired, "Session file written.");
    Ok(())
  }
}

#[async_trait]
impl SessionStore for FileSessionStore {
  async fn load(&self, session_key: &str) -> Result<StoredSession> {
    let key = session_key.to_string();
    self.blocking(move |file| file.load(&key)).await
  }

  #[instrument(name = "FileSessionStore::store", skip(self, session), fields(path = %self.file.path.display()))]
  async fn store(&self, session_key: &str, session: StoredSession) -> Result<()> {
    let key = session_key.to_string();
    self.blocking(move |file| file.store(&key, session)).await
  }
}
