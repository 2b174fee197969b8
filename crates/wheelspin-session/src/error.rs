//! Error types for the session layer.

use wheelspin_protocol::ProtocolError;

/// Why a command was refused.
///
/// The `Display` text of each variant is exactly what the requesting client
/// sees in its `error` frame, so keep it user-facing. None of these change
/// the session state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The name was missing, not a string, or the empty string.
    #[error("Invalid name.")]
    InvalidName,

    /// The trimmed name is empty or longer than the limit.
    #[error("Name must be between 1 and {max} characters.")]
    InvalidLength { max: usize },

    /// Entries are locked; a draw has already begun.
    #[error("Game is locked. Cannot join.")]
    SessionLocked,

    /// The participant list is full.
    #[error("Maximum number of participants reached.")]
    CapacityExceeded,

    /// Another participant already has this exact name.
    #[error("Name already exists. Please choose another.")]
    DuplicateName,

    /// A winner has already been drawn.
    #[error("Game already started.")]
    AlreadyStarted,

    /// Not enough participants to draw.
    #[error("Need at least {min} participants to start.")]
    InsufficientParticipants { min: usize },
}

/// Errors from loading or saving the session state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying storage failed.
    #[error("storage failed: {0}")]
    Storage(#[from] std::io::Error),

    /// The stored blob couldn't be encoded or decoded, or it breaks a
    /// session invariant.
    #[error(transparent)]
    Codec(#[from] ProtocolError),
}
