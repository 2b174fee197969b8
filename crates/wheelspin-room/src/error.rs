//! Error types for the room layer.

use wheelspin_session::StoreError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room's actor has stopped; its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(String),

    /// Loading the session state failed while opening the room.
    #[error(transparent)]
    Store(#[from] StoreError),
}
