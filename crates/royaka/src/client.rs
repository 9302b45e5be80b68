//! The [`Client`] facade: the single seam the rest of the application
//! depends on.

use std::sync::Arc;

use royaka_protocol::{Codec, Envelope, JsonCodec};
use royaka_transport::{Connector, WebSocketConnector};
use tokio::sync::{mpsc, watch};

use crate::config::{ClientConfig, ReconnectPolicy};
use crate::manager::{Command, ConnectionManager, ConnectionState};
use crate::registry::{SubscriberRegistry, Subscription};

/// Builder for configuring and starting a [`Client`].
///
/// # Example
///
/// ```rust,no_run
/// use royaka::prelude::*;
///
/// let client = Client::builder()
///     .endpoint("wss://play.example/ws")
///     .start();
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the server endpoint URL.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    /// Sets the reconnect policy.
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.config.reconnect = policy;
        self
    }

    /// Starts the connection manager over WebSocket with the JSON
    /// codec and returns the client handle.
    ///
    /// The first dial begins immediately; use
    /// [`Client::wait_until_connected`] to await it.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime (the manager is a
    /// spawned task).
    pub fn start(self) -> Client {
        let connector =
            WebSocketConnector::new(self.config.endpoint.clone());
        self.start_with(connector, JsonCodec)
    }

    /// Starts with an explicit transport and codec.
    ///
    /// This is the dependency-injection seam: tests pass an in-memory
    /// connector here to get an isolated client with no network.
    pub fn start_with<C: Connector, K: Codec>(
        self,
        connector: C,
        codec: K,
    ) -> Client {
        let registry = SubscriberRegistry::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) =
            watch::channel(ConnectionState::Disconnected);

        let manager = ConnectionManager::new(
            connector,
            codec,
            self.config.reconnect,
            Arc::clone(&registry),
            state_tx,
            cmd_rx,
        );
        tokio::spawn(manager.run());

        tracing::info!(endpoint = %self.config.endpoint, "client started");
        Client {
            cmd_tx,
            state_rx,
            registry,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the realtime hub.
///
/// Cheap to clone; all clones share the one connection, the one
/// subscriber registry, and the one observable state. The manager task
/// ends when [`stop`](Self::stop) is called or every handle is
/// dropped.
#[derive(Clone)]
pub struct Client {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    pub(crate) registry: Arc<SubscriberRegistry>,
}

impl Client {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Starts a client from a ready-made configuration.
    pub fn start(config: ClientConfig) -> Client {
        ClientBuilder::new().config(config).start()
    }

    /// Encodes and transmits an envelope on the live connection.
    ///
    /// While disconnected this is a no-op with a logged warning — the
    /// message is dropped, never buffered. Callers that need delivery
    /// confirmation should use [`request`](Self::request) or consult
    /// [`is_connected`](Self::is_connected) first.
    pub fn send_message(&self, envelope: Envelope) {
        if !self.is_connected() {
            tracing::warn!(
                kind = %envelope.kind,
                "not connected, dropping outbound message"
            );
            return;
        }
        if self.cmd_tx.send(Command::Send(envelope)).is_err() {
            tracing::warn!("client stopped, dropping outbound message");
        }
    }

    /// Registers a listener for every inbound envelope.
    ///
    /// The listener runs on the connection manager's task, once per
    /// decoded message, in registration order relative to other
    /// listeners. Keep it quick and non-blocking; hand heavy work to a
    /// channel. The returned [`Subscription`] unregisters the listener
    /// when dropped.
    pub fn subscribe(
        &self,
        listener: impl Fn(&Envelope) + Send + Sync + 'static,
    ) -> Subscription {
        self.registry.subscribe(listener)
    }

    /// Whether the connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.state_rx.borrow().is_connected()
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// A watch receiver over the lifecycle state, for reactive
    /// consumers (UI bindings, supervisors).
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Waits until the client reaches the Connected state.
    ///
    /// Returns `false` if the client stopped before ever connecting.
    pub async fn wait_until_connected(&self) -> bool {
        let mut rx = self.state_rx.clone();
        rx.wait_for(|state| state.is_connected()).await.is_ok()
    }

    /// Permanently stops the client: closes any live socket and
    /// cancels any pending reconnect. Idempotent; no further dial
    /// happens until a new client is started.
    pub fn stop(&self) {
        if self.cmd_tx.send(Command::Stop).is_ok() {
            tracing::debug!("stop requested");
        }
    }
}
