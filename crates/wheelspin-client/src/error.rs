//! Error types for the client.

use wheelspin_protocol::ProtocolError;
use wheelspin_transport::TransportError;

/// Errors surfaced by [`ClientHandle`](crate::ClientHandle) and the agent.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The agent task has exited (shut down or gave up reconnecting).
    #[error("client agent has stopped")]
    Stopped,

    /// The socket failed while sending a command.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A command could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
