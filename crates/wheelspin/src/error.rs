//! Unified error type for Wheelspin.

use wheelspin_protocol::ProtocolError;
use wheelspin_room::RoomError;
use wheelspin_session::StoreError;
use wheelspin_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WheelspinError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, inconsistent state).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Loading the persisted session failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The room actor is gone or failed to open.
    #[error(transparent)]
    Room(#[from] RoomError),
}
