//! Client side of Wheelspin.
//!
//! - [`ClientSyncAgent`] keeps one reconnecting WebSocket to the room and
//!   reconciles server frames into a [`ClientViewState`].
//! - [`PlayerView`] and [`AdminView`] derive what the two pages show.
//! - [`WheelRenderer`] lays out the wheel; [`SpinAnimation`] eases the
//!   reveal onto the winner.
//!
//! # Example
//!
//! ```rust,no_run
//! use wheelspin_client::{ClientConfig, ClientEvent, ClientSyncAgent};
//!
//! # async fn run() -> Result<(), wheelspin_client::ClientError> {
//! let (client, mut events) =
//!     ClientSyncAgent::start(ClientConfig::new("ws://127.0.0.1:8080"));
//! client.join("Alice")?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ClientEvent::RevealFinished { winner } => {
//!             println!("{} wins!", winner.name);
//!         }
//!         ClientEvent::Terminal(message) => {
//!             eprintln!("{message}");
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod agent;
mod animation;
mod config;
mod error;
mod renderer;
mod view;

pub use agent::{ClientEvent, ClientHandle, ClientSyncAgent};
pub use animation::{SpinAnimation, SpinStep};
pub use config::{ClientConfig, ReconnectPolicy};
pub use error::ClientError;
pub use renderer::{
    PALETTE, POINTER_ANGLE, Slice, SliceLabel, WheelFrame, WheelGeometry,
    WheelRenderer, landing_rotation, normalize_angle, slice_at_pointer,
    slice_width,
};
pub use view::{
    AdminView, CONNECTION_LOST_MESSAGE, ClientViewState, ConnectionState,
    CurrentUser, ERROR_BANNER_TTL, ErrorBanner, NOT_CONNECTED_MESSAGE, Panel,
    ParticipantEntry, PlayerView,
};
