//! Fan-out of server frames to connections.

use std::collections::HashMap;

use tokio::sync::mpsc;
use wheelspin_protocol::{Codec, JsonCodec, ServerFrame};
use wheelspin_transport::ConnectionId;

/// Outbound queue for one connection. Each connection task drains its own
/// receiver onto the socket.
pub type ConnectionSender = mpsc::UnboundedSender<String>;

/// Registry of open connections with unicast and broadcast delivery.
///
/// Frames are encoded once, then pushed onto each connection's unbounded
/// queue. Pushing never waits, so a slow socket holds up only its own
/// writer task. A queue whose receiver is gone belongs to a dead connection
/// and is dropped from the registry on the spot.
pub struct BroadcastGateway {
    connections: HashMap<ConnectionId, ConnectionSender>,
    codec: JsonCodec,
}

impl BroadcastGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            codec: JsonCodec,
        }
    }

    /// Starts delivering to `conn_id`.
    pub fn register(&mut self, conn_id: ConnectionId, sender: ConnectionSender) {
        self.connections.insert(conn_id, sender);
    }

    /// Stops delivering to `conn_id`. Returns `false` if it wasn't known.
    pub fn unregister(&mut self, conn_id: ConnectionId) -> bool {
        self.connections.remove(&conn_id).is_some()
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Sends `frame` to one connection. Returns `true` if it was queued.
    pub fn unicast(&mut self, conn_id: ConnectionId, frame: &ServerFrame) -> bool {
        let Some(text) = self.encode(frame) else {
            return false;
        };
        let Some(sender) = self.connections.get(&conn_id) else {
            tracing::debug!(%conn_id, "unicast to unknown connection dropped");
            return false;
        };
        if sender.send(text).is_err() {
            self.connections.remove(&conn_id);
            tracing::debug!(%conn_id, "pruned closed connection");
            return false;
        }
        true
    }

    /// Sends `frame` to every connection. Returns how many queued it.
    pub fn broadcast(&mut self, frame: &ServerFrame) -> usize {
        let Some(text) = self.encode(frame) else {
            return 0;
        };
        let before = self.connections.len();
        self.connections
            .retain(|_, sender| sender.send(text.clone()).is_ok());
        let delivered = self.connections.len();
        if delivered < before {
            tracing::debug!(
                pruned = before - delivered,
                "pruned closed connections during broadcast"
            );
        }
        delivered
    }

    fn encode(&self, frame: &ServerFrame) -> Option<String> {
        match self.codec.encode(frame) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode server frame");
                None
            }
        }
    }
}

impl Default for BroadcastGateway {
    fn default() -> Self {
        Self::new()
    }
}
