//! Room actor: an isolated Tokio task that owns one wheel session.
//!
//! Every connection talks to the room through a bounded mpsc channel of
//! [`RoomCommand`]s. The actor pulls one command at a time, so each
//! read-modify-write of the session runs to completion before the next
//! begins. Nothing else can touch the state.
//!
//! An accepted command goes through three steps in a fixed order:
//!
//! ```text
//! machine.handle()  →  store.save().await  →  machine.commit()  →  gateway.broadcast()
//!  (compute next)        (durable first)        (authoritative)      (everyone sees it)
//! ```
//!
//! If the save fails, the actor stops after step two. Memory and storage
//! stay on the previous state, and only the requester hears about it.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use wheelspin_protocol::{
    ClientFrame, Codec, JsonCodec, Phase, ServerFrame, SessionState,
};
use wheelspin_session::{SessionMachine, SessionStore, Storage};
use wheelspin_transport::ConnectionId;

use crate::{BroadcastGateway, ConnectionSender, RoomConfig, RoomError};

/// Sent to a connection whose frame could not be decoded.
pub const MALFORMED_FRAME_MESSAGE: &str = "Invalid message format";

/// Sent to the requester when an accepted command could not be persisted.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save game state.";

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Register a connection and send it the current state.
    Connect {
        conn_id: ConnectionId,
        sender: ConnectionSender,
        reply: oneshot::Sender<()>,
    },

    /// Forget a connection. Session membership is untouched.
    Disconnect { conn_id: ConnectionId },

    /// A raw text frame from a connection.
    Message { conn_id: ConnectionId, text: String },

    /// Request a snapshot of the room.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Stop the actor.
    Shutdown,
}

/// A snapshot of a room, taken between two commands.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's name.
    pub name: String,
    /// Current session phase.
    pub phase: Phase,
    /// Number of open connections (not participants).
    pub connections: usize,
    /// The authoritative session state.
    pub state: SessionState,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: it's an `mpsc::Sender` and the room name.
#[derive(Clone)]
pub struct RoomHandle {
    name: String,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Loads the room's persisted state and starts its actor.
    ///
    /// This is the room's start-up hook: the first command is processed
    /// only after the stored state (or the empty default) is in place.
    ///
    /// # Errors
    /// Returns [`RoomError::Store`] if the stored state can't be read or
    /// is inconsistent. The room does not start on a bad blob.
    pub async fn open<S: Storage>(
        config: RoomConfig,
        storage: S,
    ) -> Result<Self, RoomError> {
        let store = SessionStore::new(storage, &config.name)
            .with_limits(config.limits.clone());
        let state = store.load().await?;
        Ok(spawn_room(config, state, store))
    }

    /// Returns the room's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a connection. The room replies by queueing the current
    /// state on `sender` before this returns.
    pub async fn connect(
        &self,
        conn_id: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Connect {
            conn_id,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Unregisters a connection (fire-and-forget).
    pub async fn disconnect(
        &self,
        conn_id: ConnectionId,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnect { conn_id }).await
    }

    /// Delivers a raw text frame from a connection (fire-and-forget).
    ///
    /// Decoding happens inside the actor so a malformed frame can be
    /// answered on the same ordered path as everything else.
    pub async fn send_message(
        &self,
        conn_id: ConnectionId,
        text: String,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Message { conn_id, text }).await
    }

    /// Requests a snapshot of the room.
    ///
    /// Commands are processed in order, so the snapshot reflects every
    /// command this handle sent before it.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down. Open connection queues close with it.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.name.clone())
    }
}

/// Spawns a room actor around an already-loaded state.
pub(crate) fn spawn_room<S: Storage>(
    config: RoomConfig,
    state: SessionState,
    store: SessionStore<S>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let name = config.name.clone();

    let actor = RoomActor {
        machine: SessionMachine::new(state, config.limits),
        name: config.name,
        store,
        gateway: BroadcastGateway::new(),
        codec: JsonCodec,
        rng,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { name, sender: tx }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<S: Storage> {
    name: String,
    machine: SessionMachine,
    store: SessionStore<S>,
    gateway: BroadcastGateway,
    codec: JsonCodec,
    rng: StdRng,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<S: Storage> RoomActor<S> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(
            room = %self.name,
            phase = %self.machine.phase(),
            participants = self.machine.state().participants.len(),
            "room actor started"
        );

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Connect {
                    conn_id,
                    sender,
                    reply,
                } => {
                    self.handle_connect(conn_id, sender);
                    let _ = reply.send(());
                }
                RoomCommand::Disconnect { conn_id } => {
                    self.handle_disconnect(conn_id);
                }
                RoomCommand::Message { conn_id, text } => {
                    self.handle_message(conn_id, &text).await;
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %self.name, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room = %self.name, "room actor stopped");
    }

    fn handle_connect(&mut self, conn_id: ConnectionId, sender: ConnectionSender) {
        self.gateway.register(conn_id, sender);
        let snapshot = ServerFrame::State {
            state: self.machine.state().clone(),
        };
        self.gateway.unicast(conn_id, &snapshot);
        tracing::info!(
            room = %self.name,
            %conn_id,
            connections = self.gateway.len(),
            "connection opened"
        );
    }

    fn handle_disconnect(&mut self, conn_id: ConnectionId) {
        if self.gateway.unregister(conn_id) {
            tracing::info!(
                room = %self.name,
                %conn_id,
                connections = self.gateway.len(),
                "connection closed"
            );
        }
    }

    async fn handle_message(&mut self, conn_id: ConnectionId, text: &str) {
        let frame: ClientFrame = match self.codec.decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(room = %self.name, %conn_id, error = %e, "malformed frame");
                self.reply_error(conn_id, MALFORMED_FRAME_MESSAGE);
                return;
            }
        };

        let transition = match self.machine.handle(&frame, &mut self.rng) {
            None => {
                tracing::debug!(room = %self.name, %conn_id, "ignoring unknown frame type");
                return;
            }
            Some(Err(e)) => {
                tracing::debug!(room = %self.name, %conn_id, error = %e, "command rejected");
                self.reply_error(conn_id, &e.to_string());
                return;
            }
            Some(Ok(transition)) => transition,
        };

        if let Err(e) = self.store.save(&transition.state).await {
            tracing::error!(
                room = %self.name,
                %conn_id,
                error = %e,
                "failed to persist session, change discarded"
            );
            self.reply_error(conn_id, SAVE_FAILED_MESSAGE);
            return;
        }

        self.machine.commit(transition.state);
        let delivered = self.gateway.broadcast(&transition.broadcast);
        tracing::info!(
            room = %self.name,
            %conn_id,
            phase = %self.machine.phase(),
            participants = self.machine.state().participants.len(),
            delivered,
            "session updated"
        );
    }

    fn reply_error(&mut self, conn_id: ConnectionId, message: &str) {
        self.gateway.unicast(
            conn_id,
            &ServerFrame::Error {
                message: message.to_string(),
            },
        );
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            name: self.name.clone(),
            phase: self.machine.phase(),
            connections: self.gateway.len(),
            state: self.machine.state().clone(),
        }
    }
}
