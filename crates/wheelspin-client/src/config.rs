//! Client configuration.

use std::time::Duration;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default animation frame interval (~60 Hz).
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// How long to wait between reconnection attempts, and when to give up.
///
/// The wait before retry `n` (0-based) is `base × 2^n`. Once `max_attempts`
/// retries have failed the agent stops for good.
///
/// ```
/// use std::time::Duration;
/// use wheelspin_client::ReconnectPolicy;
///
/// let policy = ReconnectPolicy::default();
/// assert_eq!(policy.delay(0), Duration::from_secs(1));
/// assert_eq!(policy.delay(3), Duration::from_secs(8));
/// assert!(policy.is_exhausted(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Retries allowed before the connection is declared lost.
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Returns `true` once `attempt` retries have been used up.
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max_attempts: 5,
        }
    }
}

/// Configuration for a [`ClientSyncAgent`](crate::ClientSyncAgent).
///
/// The only required field is the server URL.
///
/// ```
/// use std::time::Duration;
/// use wheelspin_client::{ClientConfig, ReconnectPolicy};
///
/// let config = ClientConfig::new("ws://127.0.0.1:8080")
///     .with_reconnect(ReconnectPolicy {
///         base: Duration::from_millis(250),
///         max_attempts: 3,
///     })
///     .with_event_channel_capacity(64);
/// assert_eq!(config.event_channel_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the room, e.g. `ws://host:8080`.
    pub url: String,
    /// Reconnection backoff.
    pub reconnect: ReconnectPolicy,
    /// Interval between animation frames while a reveal is running.
    /// Values below 1ms are clamped to 1ms.
    pub frame_interval: Duration,
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer falls behind, events are dropped (with a warning)
    /// instead of stalling the agent. The terminal event is always
    /// delivered. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
}

impl ClientConfig {
    /// Creates a configuration for `url` with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectPolicy::default(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }

    /// Sets the reconnection policy.
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Sets the animation frame interval.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Sets the capacity of the bounded event channel.
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }
}
