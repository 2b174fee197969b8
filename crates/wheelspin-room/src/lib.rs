//! Room layer for Wheelspin.
//!
//! A room is one wheel session served to many connections. It runs as an
//! isolated Tokio task (actor model) that owns the [`SessionMachine`],
//! the [`SessionStore`] and the [`BroadcastGateway`].
//!
//! # Key types
//!
//! - [`RoomHandle`] — open a room, send commands to its actor
//! - [`RoomConfig`] — name, limits, channel size
//! - [`BroadcastGateway`] — unicast/broadcast to registered connections
//!
//! [`SessionMachine`]: wheelspin_session::SessionMachine
//! [`SessionStore`]: wheelspin_session::SessionStore

mod config;
mod error;
mod gateway;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use gateway::{BroadcastGateway, ConnectionSender};
pub use room::{
    MALFORMED_FRAME_MESSAGE, RoomHandle, RoomInfo, SAVE_FAILED_MESSAGE,
};
