//! Room configuration.

use wheelspin_session::SessionLimits;

/// Configuration for a room instance.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Room name. Namespaces the storage key (`<name>/state`) and tags
    /// every log line.
    pub name: String,

    /// Join/start limits handed to the session machine.
    pub limits: SessionLimits,

    /// Capacity of the actor's command channel. When it fills up,
    /// connection tasks wait (backpressure) instead of queueing forever.
    pub channel_size: usize,

    /// Fixed seed for the draw and participant ids. `None` seeds from
    /// the OS. Only tests should set this.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name: "wheel".to_string(),
            limits: SessionLimits::default(),
            channel_size: 64,
            seed: None,
        }
    }
}
