// storefront/src/watches.rs

//! Mounted return-route watches, addressable by id across requests.

use cacao_checkout::{ReturnSnapshot, ReturnWatch};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Watches left mounted longer than this are unmounted on the next prune.
pub const WATCH_TTL: Duration = Duration::from_secs(15 * 60);

/// How long a settled watch stays readable before a prune drops it.
pub const SETTLED_GRACE: Duration = Duration::from_secs(60);

/// Period of the background prune started by `main`.
pub const PRUNE_EVERY: Duration = Duration::from_secs(60);

struct MountedWatch {
  watch: ReturnWatch,
  mounted_at: Instant,
  settled_at: Option<Instant>,
}

impl MountedWatch {
  /// Records the first time the watch was seen settled.
  fn observe(&mut self, now: Instant) -> ReturnSnapshot {
    let snapshot = self.watch.snapshot();
    if self.settled_at.is_none() && snapshot.is_settled() {
      self.settled_at = Some(now);
    }
    snapshot
  }

  fn is_expired(&mut self, now: Instant, ttl: Duration, grace: Duration) -> bool {
    self.observe(now);
    now.saturating_duration_since(self.mounted_at) >= ttl
      || self.settled_at.map_or(false, |at| now.saturating_duration_since(at) >= grace)
  }
}

#[derive(Default)]
pub struct WatchRegistry {
  watches: Mutex<HashMap<Uuid, MountedWatch>>,
}

impl WatchRegistry {
  pub fn mount(&self, watch: ReturnWatch) -> Uuid {
    self.prune();
    let id = Uuid::new_v4();
    let now = Instant::now();
    let mut mounted = MountedWatch {
      watch,
      mounted_at: now,
      settled_at: None,
    };
    mounted.observe(now);
    let mut watches = self.watches.lock();
    watches.insert(id, mounted);
    tracing::debug!(watch_id = %id, mounted = watches.len(), "Payment watch registered.");
    id
  }

  pub fn snapshot(&self, id: &Uuid) -> Option<ReturnSnapshot> {
    let now = Instant::now();
    self.watches.lock().get_mut(id).map(|m| m.observe(now))
  }

  /// Stops the watch's worker and forgets it. Returns false for unknown ids.
  pub fn unmount(&self, id: &Uuid) -> bool {
    match self.watches.lock().remove(id) {
      Some(mounted) => {
        mounted.watch.unmount();
        true
      }
      None => false,
    }
  }

  /// Drops watches past `WATCH_TTL` and settled watches past `SETTLED_GRACE`.
  pub fn prune(&self) -> usize {
    self.prune_at(Instant::now(), WATCH_TTL, SETTLED_GRACE)
  }

  /// Returns how many watches were removed.
  pub fn prune_at(&self, now: Instant, ttl: Duration, grace: Duration) -> usize {
    let mut watches = self.watches.lock();
    let before = watches.len();
    watches.retain(|id, mounted| {
      let expired = mounted.is_expired(now, ttl, grace);
      if expired {
        tracing::debug!(watch_id = %id, settled = mounted.settled_at.is_some(), "Unmounting payment watch.");
        mounted.watch.unmount();
      }
      !expired
    });
    before - watches.len()
  }

  pub fn len(&self) -> usize {
    self.watches.lock().len()
  }
}
