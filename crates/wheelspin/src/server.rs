//! `WheelspinServer` builder and server loop.
//!
//! This is the entry point for hosting a wheel. It ties the layers
//! together: transport → room actor → session machine → storage.

use std::net::SocketAddr;

use wheelspin_room::{RoomConfig, RoomHandle};
use wheelspin_session::{SessionLimits, Storage};
use wheelspin_transport::{Transport, WebSocketTransport};

use crate::WheelspinError;
use crate::handler::handle_connection;

/// Builder for configuring and starting a Wheelspin server.
///
/// # Example
///
/// ```rust,no_run
/// use wheelspin::prelude::*;
///
/// # async fn run() -> Result<(), WheelspinError> {
/// let server = WheelspinServer::builder()
///     .bind("0.0.0.0:8080")
///     .room("office-party")
///     .build(MemoryStorage::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct WheelspinServerBuilder {
    bind_addr: String,
    room: RoomConfig,
}

impl WheelspinServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room name. It namespaces the storage key.
    pub fn room(mut self, name: &str) -> Self {
        self.room.name = name.to_string();
        self
    }

    /// Sets the join/start limits.
    pub fn limits(mut self, limits: SessionLimits) -> Self {
        self.room.limits = limits;
        self
    }

    /// Sets the capacity of the room's command channel.
    pub fn channel_size(mut self, size: usize) -> Self {
        self.room.channel_size = size;
        self
    }

    /// Replaces the whole room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room = config;
        self
    }

    /// Binds the listener, loads the session from `storage` and starts
    /// the room.
    ///
    /// # Errors
    /// Fails if the address can't be bound or the stored session can't
    /// be loaded. A corrupt store stops start-up rather than being wiped.
    pub async fn build<S: Storage>(
        self,
        storage: S,
    ) -> Result<WheelspinServer, WheelspinError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let room = RoomHandle::open(self.room, storage).await?;

        Ok(WheelspinServer { transport, room })
    }
}

impl Default for WheelspinServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Wheelspin server hosting one room.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct WheelspinServer {
    transport: WebSocketTransport,
    room: RoomHandle,
}

impl WheelspinServer {
    /// Creates a new builder.
    pub fn builder() -> WheelspinServerBuilder {
        WheelspinServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle to the hosted room.
    pub fn room(&self) -> RoomHandle {
        self.room.clone()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), WheelspinError> {
        tracing::info!(
            addr = ?self.transport.local_addr().ok(),
            room = %self.room.name(),
            "wheelspin server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let room = self.room.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, room).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
