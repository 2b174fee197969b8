//! Per-connection handler: attaches a socket to the room.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the room → it queues the current `state`
//!   2. Spawn a writer task draining the outbound queue onto the socket
//!   3. Loop: receive text frames → forward them to the room verbatim
//!
//! Decoding and validation happen in the room actor so every reply,
//! malformed input included, travels the same ordered path.

use std::sync::Arc;

use tokio::sync::mpsc;
use wheelspin_room::RoomHandle;
use wheelspin_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::WheelspinError;

/// Drop guard that unregisters a connection when the handler exits.
///
/// Runs even if the handler panics. `Drop` is synchronous, so the async
/// call goes into a fire-and-forget task.
struct ConnectionGuard {
    conn_id: ConnectionId,
    room: RoomHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let room = self.room.clone();
        tokio::spawn(async move {
            let _ = room.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    room: RoomHandle,
) -> Result<(), WheelspinError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    room.connect(conn_id, tx).await?;
    let _guard = ConnectionGuard {
        conn_id,
        room: room.clone(),
    };

    // The writer ends when the room drops our queue or the socket fails.
    let writer = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if let Err(e) = conn.send(&text).await {
                    tracing::debug!(%conn_id, error = %e, "send failed");
                    break;
                }
            }
        })
    };

    loop {
        match conn.recv().await {
            Ok(Some(text)) => {
                room.send_message(conn_id, text).await?;
            }
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        }
    }

    writer.abort();
    // _guard drops here → room disconnect fires.
    Ok(())
}
