//! # Wheelspin
//!
//! Realtime prize wheel sessions over WebSocket.
//!
//! Participants join a shared wheel by name, an admin spins it, and every
//! connected client sees the same participant list and the same winner.
//! The server is authoritative: it validates joins, draws the winner once,
//! persists the session, and only then tells everyone.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wheelspin::prelude::*;
//!
//! # async fn run() -> Result<(), WheelspinError> {
//! let server = WheelspinServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(MemoryStorage::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::WheelspinError;
pub use server::{WheelspinServer, WheelspinServerBuilder};

/// Re-exports for hosting a wheel.
pub mod prelude {
    pub use crate::{WheelspinError, WheelspinServer, WheelspinServerBuilder};
    pub use wheelspin_protocol::{
        ClientFrame, Participant, ParticipantId, Phase, ServerFrame,
        SessionState,
    };
    pub use wheelspin_room::{RoomConfig, RoomHandle, RoomInfo};
    pub use wheelspin_session::{
        FileStorage, MemoryStorage, SessionLimits, Storage,
    };
}
