// cacao_checkout/src/checkout/settings.rs

use std::time::Duration;

/// The only gateway enabled for checkout.
pub const ZIINA_GATEWAY: &str = "ZIINA";
pub const DEFAULT_CURRENCY: &str = "AED";
pub const AUTO_CONFIRM_NOTE: &str = "auto-confirmed after payment verification";

/// Polling never runs faster than this, whatever `PollPolicy::interval` says.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the success route keeps polling the payment.
///
/// Both bounds default to `None`: polling runs until a terminal status is seen or the
/// watch is unmounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
  pub interval: Duration,
  pub max_attempts: Option<u32>,
  pub max_duration: Option<Duration>,
}

impl Default for PollPolicy {
  fn default() -> Self {
    Self {
      interval: Duration::from_secs(3),
      max_attempts: None,
      max_duration: None,
    }
  }
}

impl PollPolicy {
  /// The interval actually used between polls. A zero or tiny interval is raised to
  /// `MIN_POLL_INTERVAL`.
  pub fn tick_interval(&self) -> Duration {
    self.interval.max(MIN_POLL_INTERVAL)
  }

  /// Whether another poll may be issued after `attempts` polls and `elapsed` time.
  pub fn allows(&self, attempts: u32, elapsed: Duration) -> bool {
    self.max_attempts.map_or(true, |max| attempts < max) && self.max_duration.map_or(true, |max| elapsed < max)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
  pub gateway_name: String,
  pub currency: String,
  pub poll: PollPolicy,
  /// Wait before re-reading the payment after verification reported it settled.
  pub verify_refresh_delay: Duration,
  /// Wait before re-reading the payment after a failed auto-confirmation.
  pub confirmation_retry_delay: Duration,
  pub confirmation_note: String,
}

impl Default for CheckoutSettings {
  fn default() -> Self {
    Self {
      gateway_name: ZIINA_GATEWAY.to_string(),
      currency: DEFAULT_CURRENCY.to_string(),
      poll: PollPolicy::default(),
      verify_refresh_delay: Duration::from_secs(1),
      confirmation_retry_delay: Duration::from_secs(2),
      confirmation_note: AUTO_CONFIRM_NOTE.to_string(),
    }
  }
}
