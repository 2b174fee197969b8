//! The client sync agent: one reconnecting connection per client.
//!
//! [`ClientSyncAgent::start`] spawns a background task and returns a
//! [`ClientHandle`] for issuing commands plus a bounded receiver of
//! [`ClientEvent`]s. The task owns the [`ClientViewState`] and publishes a
//! copy through a `watch` channel after every change.
//!
//! ```text
//!            connect ok                 recv None / error
//! Connecting ──────────→ Connected ──────────────────────→ Disconnected
//!     ▲                                                          │
//!     └──────────── sleep(base × 2^attempt) ─────────────────────┘
//!                   (gives up once max_attempts is reached)
//! ```
//!
//! The reveal animation keeps running on the frame interval whatever the
//! connection is doing.

use std::pin::pin;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use wheelspin_protocol::{
    ClientFrame, Codec, JsonCodec, Participant, ServerFrame, SessionState,
};
use wheelspin_transport::{
    ClientConnection, Connection, TransportError, connect,
};

use crate::animation::{SpinAnimation, SpinStep};
use crate::view::{
    CONNECTION_LOST_MESSAGE, ClientViewState, ConnectionState,
    NOT_CONNECTED_MESSAGE,
};
use crate::{ClientConfig, ClientError};

/// Floor for the animation frame interval; a zero period can't tick.
const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// Something the consumer may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The transport changed state.
    Connection(ConnectionState),
    /// A `state` frame replaced the snapshot.
    StateUpdated(SessionState),
    /// A `winner` frame started the spin.
    RevealStarted {
        winner: Participant,
        winner_index: usize,
    },
    /// The spin landed.
    RevealFinished { winner: Participant },
    /// The server rejected something this client sent.
    ServerError(String),
    /// Reconnection was abandoned. Always the last event.
    Terminal(String),
}

enum Command {
    Join(String),
    Start,
    Reset,
    Shutdown,
}

/// How a connected session or a backoff wait ended.
enum Exit {
    /// Keep going: reconnect.
    Retry,
    /// Stop the agent.
    Shutdown,
}

/// Entry point: spawns the agent task.
pub struct ClientSyncAgent;

impl ClientSyncAgent {
    /// Starts connecting to `config.url` in the background.
    ///
    /// Must be called within a Tokio runtime.
    pub fn start(config: ClientConfig) -> (ClientHandle, mpsc::Receiver<ClientEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity.max(1));
        let (view_tx, view_rx) = watch::channel(ClientViewState::new());

        let mut frames =
            tokio::time::interval(config.frame_interval.max(MIN_FRAME_INTERVAL));
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let agent = AgentLoop {
            config,
            view: ClientViewState::new(),
            view_tx,
            events: event_tx,
            commands: cmd_rx,
            spin: None,
            frames,
            codec: JsonCodec,
        };
        let task = tokio::spawn(agent.run());

        let handle = ClientHandle {
            commands: cmd_tx,
            view: view_rx,
            task,
        };
        (handle, event_rx)
    }
}

/// Handle for driving a running agent.
///
/// Commands are fire-and-forget. Their outcome shows up as view changes
/// and events, never as a return value.
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<ClientViewState>,
    task: JoinHandle<()>,
}

impl ClientHandle {
    /// Asks to join under `name`. A blank name is ignored.
    pub fn join(&self, name: &str) -> Result<(), ClientError> {
        self.send(Command::Join(name.to_string()))
    }

    /// Asks the server to lock entries and draw a winner.
    pub fn start(&self) -> Result<(), ClientError> {
        self.send(Command::Start)
    }

    /// Asks the server to clear the session.
    pub fn reset(&self) -> Result<(), ClientError> {
        self.send(Command::Reset)
    }

    /// Returns a copy of the current view.
    pub fn view(&self) -> ClientViewState {
        self.view.borrow().clone()
    }

    /// Returns a receiver that is notified on every view change.
    pub fn watch(&self) -> watch::Receiver<ClientViewState> {
        self.view.clone()
    }

    /// Returns `true` once the agent task has exited.
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }

    /// Closes the connection and waits for the agent to exit.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        let _ = self.task.await;
    }

    fn send(&self, cmd: Command) -> Result<(), ClientError> {
        self.commands.send(cmd).map_err(|_| ClientError::Stopped)
    }
}

struct AgentLoop {
    config: ClientConfig,
    view: ClientViewState,
    view_tx: watch::Sender<ClientViewState>,
    events: mpsc::Sender<ClientEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    spin: Option<SpinAnimation>,
    frames: Interval,
    codec: JsonCodec,
}

impl AgentLoop {
    async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            self.set_connection(ConnectionState::Connecting);
            let conn = match self.connect().await {
                Ok(Some(conn)) => conn,
                Ok(None) => return,
                Err(e) => {
                    warn!(url = %self.config.url, attempt, error = %e, "connect failed");
                    self.set_connection(ConnectionState::Disconnected);
                    if self.wait_before_retry(&mut attempt).await {
                        continue;
                    }
                    return;
                }
            };

            info!(url = %self.config.url, id = %conn.id(), "connected");
            attempt = 0;
            self.set_connection(ConnectionState::Connected);

            let exit = self.session(&conn).await;
            let _ = conn.close().await;
            self.set_connection(ConnectionState::Disconnected);
            if let Exit::Shutdown = exit {
                return;
            }
            if !self.wait_before_retry(&mut attempt).await {
                return;
            }
        }
    }

    /// Opens a connection while still serving commands and frames.
    /// `Ok(None)` means shutdown was requested.
    async fn connect(
        &mut self,
    ) -> Result<Option<ClientConnection>, TransportError> {
        let url = self.config.url.clone();
        let mut connecting = pin!(connect(&url));
        loop {
            tokio::select! {
                result = &mut connecting => return result.map(Some),
                cmd = self.commands.recv() => {
                    if let Exit::Shutdown = self.handle_offline(cmd) {
                        return Ok(None);
                    }
                }
                _ = self.frames.tick(), if self.spin.is_some() => self.advance_spin(),
            }
        }
    }

    /// Sleeps for the next backoff delay. Returns `false` if the agent
    /// should stop, either because retries are used up or on shutdown.
    async fn wait_before_retry(&mut self, attempt: &mut u32) -> bool {
        let policy = self.config.reconnect;
        if policy.is_exhausted(*attempt) {
            warn!(attempts = *attempt, "giving up on reconnecting");
            self.view.set_terminal(CONNECTION_LOST_MESSAGE);
            self.publish();
            // Delivered even if the consumer is behind.
            let _ = self
                .events
                .send(ClientEvent::Terminal(CONNECTION_LOST_MESSAGE.to_string()))
                .await;
            return false;
        }

        let delay = policy.delay(*attempt);
        *attempt += 1;
        debug!(attempt = *attempt, ?delay, "reconnecting after delay");

        let mut sleep = pin!(tokio::time::sleep(delay));
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                cmd = self.commands.recv() => {
                    if let Exit::Shutdown = self.handle_offline(cmd) {
                        return false;
                    }
                }
                _ = self.frames.tick(), if self.spin.is_some() => self.advance_spin(),
            }
        }
    }

    /// Runs one connected session until the socket drops or shutdown.
    async fn session(&mut self, conn: &ClientConnection) -> Exit {
        loop {
            tokio::select! {
                incoming = conn.recv() => match incoming {
                    Ok(Some(text)) => self.handle_frame(&text),
                    Ok(None) => {
                        info!("server closed the connection");
                        return Exit::Retry;
                    }
                    Err(e) => {
                        warn!(error = %e, "receive failed");
                        return Exit::Retry;
                    }
                },
                cmd = self.commands.recv() => {
                    let Some(cmd) = cmd else {
                        return Exit::Shutdown;
                    };
                    match self.send_command(conn, cmd).await {
                        Ok(Some(Exit::Shutdown)) => return Exit::Shutdown,
                        Ok(_) => {}
                        Err(ClientError::Transport(e)) => {
                            warn!(error = %e, "send failed");
                            return Exit::Retry;
                        }
                        Err(e) => warn!(error = %e, "command dropped"),
                    }
                }
                _ = self.frames.tick(), if self.spin.is_some() => self.advance_spin(),
            }
        }
    }

    async fn send_command(
        &mut self,
        conn: &ClientConnection,
        cmd: Command,
    ) -> Result<Option<Exit>, ClientError> {
        let frame = match cmd {
            Command::Join(name) => {
                let Some(name) = self.view.request_join(&name) else {
                    debug!("ignoring blank join");
                    return Ok(None);
                };
                self.publish();
                ClientFrame::join(name)
            }
            Command::Start => ClientFrame::Start,
            Command::Reset => ClientFrame::Reset,
            Command::Shutdown => return Ok(Some(Exit::Shutdown)),
        };
        let text = self.codec.encode(&frame)?;
        conn.send(&text).await?;
        Ok(None)
    }

    /// A command arrived while no connection is open.
    fn handle_offline(&mut self, cmd: Option<Command>) -> Exit {
        match cmd {
            None | Some(Command::Shutdown) => Exit::Shutdown,
            Some(_) => {
                debug!("command issued while offline");
                self.view
                    .apply_error(NOT_CONNECTED_MESSAGE.to_string(), Instant::now());
                self.publish();
                Exit::Retry
            }
        }
    }

    fn handle_frame(&mut self, text: &str) {
        let frame: ServerFrame = match self.codec.decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                return;
            }
        };

        match frame {
            ServerFrame::State { state } => {
                self.view.apply_state(state);
                self.emit(ClientEvent::StateUpdated(self.view.snapshot.clone()));
            }
            ServerFrame::Winner {
                winner,
                winner_index,
            } => match self.view.begin_reveal(winner.clone(), winner_index) {
                Some(spin) => {
                    info!(winner = %winner.name, winner_index, "reveal started");
                    self.spin = Some(spin);
                    self.frames.reset();
                    self.emit(ClientEvent::RevealStarted {
                        winner,
                        winner_index,
                    });
                }
                None if self.view.queued_reveal.is_some() => {
                    debug!(
                        winner = %winner.name,
                        winner_index,
                        "reveal queued behind running spin"
                    );
                }
                None => debug!(winner = %winner.name, "winner frame not animated"),
            },
            ServerFrame::Error { message } => {
                debug!(%message, "server error");
                self.view.apply_error(message.clone(), Instant::now());
                self.emit(ClientEvent::ServerError(message));
            }
        }
        self.publish();
    }

    fn advance_spin(&mut self) {
        let Some(spin) = self.spin else {
            return;
        };
        if self.view.tick(&spin) == SpinStep::Finished {
            self.spin = self.view.take_queued_reveal();
            let Some(winner) = self.view.snapshot.winner.clone() else {
                self.publish();
                return;
            };
            match self.spin {
                Some(next) => {
                    info!(winner = %winner.name, "queued reveal started");
                    self.emit(ClientEvent::RevealStarted {
                        winner,
                        winner_index: next.winner_index(),
                    });
                }
                None => {
                    info!(winner = %winner.name, "reveal finished");
                    self.emit(ClientEvent::RevealFinished { winner });
                }
            }
        }
        self.publish();
    }

    fn set_connection(&mut self, state: ConnectionState) {
        if self.view.connection == state {
            return;
        }
        self.view.connection = state;
        self.publish();
        self.emit(ClientEvent::Connection(state));
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view.clone());
    }

    fn emit(&self, event: ClientEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(?event, "event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
