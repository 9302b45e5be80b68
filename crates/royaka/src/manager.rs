//! The connection manager: owns the socket lifecycle and the dispatch
//! of inbound frames.
//!
//! One manager task exists per [`Client`](crate::Client). The task is
//! the sole owner of the underlying connection — nothing else can read
//! or write it — and cycles through three phases until stopped:
//!
//! ```text
//! Disconnected ──dial──→ Connecting ──(open)──→ Connected
//!       ↑                    │                      │
//!       │                (dial failed)        (close / error)
//!       └──(retry delay)─────┴──────────────────────┘
//! ```
//!
//! A stop command (or dropping the last client handle) exits the cycle
//! from any phase, closing a live socket and cancelling a pending
//! retry. Transport failures never propagate to callers; they resolve
//! into the observable state and the retry loop.

use std::sync::Arc;
use std::time::Duration;

use royaka_protocol::{Codec, Envelope};
use royaka_transport::{Connection, Connector};
use tokio::sync::{mpsc, watch};

use crate::config::ReconnectPolicy;
use crate::registry::SubscriberRegistry;

/// Connection lifecycle states, observable through
/// [`Client::watch_state`](crate::Client::watch_state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket; either before the first dial, between retries, or
    /// after a stop.
    Disconnected,
    /// A dial is in flight.
    Connecting,
    /// The socket is open and frames flow.
    Connected,
}

impl ConnectionState {
    /// `true` only in the [`Connected`](Self::Connected) state.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Commands from client handles to the manager task.
pub(crate) enum Command {
    /// Encode and transmit an envelope on the live socket.
    Send(Envelope),
    /// Tear down: close the socket, cancel retries, end the task.
    Stop,
}

pub(crate) struct ConnectionManager<C: Connector, K: Codec> {
    connector: C,
    codec: K,
    reconnect: ReconnectPolicy,
    registry: Arc<SubscriberRegistry>,
    state_tx: watch::Sender<ConnectionState>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl<C: Connector, K: Codec> ConnectionManager<C, K> {
    pub(crate) fn new(
        connector: C,
        codec: K,
        reconnect: ReconnectPolicy,
        registry: Arc<SubscriberRegistry>,
        state_tx: watch::Sender<ConnectionState>,
        cmd_rx: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Self {
            connector,
            codec,
            reconnect,
            registry,
            state_tx,
            cmd_rx,
        }
    }

    /// Runs the dial/drive/retry cycle until a stop command arrives or
    /// every client handle is dropped.
    pub(crate) async fn run(mut self) {
        let mut attempt: u32 = 0;
        loop {
            self.state_tx.send_replace(ConnectionState::Connecting);
            match self.connector.connect().await {
                Ok(conn) => {
                    attempt = 0;
                    tracing::info!(conn = %conn.id(), "connected");
                    self.state_tx.send_replace(ConnectionState::Connected);
                    let stopped = self.drive(conn).await;
                    // The connection dropped inside `drive`; at most
                    // one socket is ever alive.
                    self.state_tx
                        .send_replace(ConnectionState::Disconnected);
                    if stopped {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "connect failed");
                    self.state_tx
                        .send_replace(ConnectionState::Disconnected);
                }
            }

            attempt += 1;
            let delay = self.reconnect.delay_for(attempt);
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "scheduling reconnect"
            );
            if self.wait_retry(delay).await {
                break;
            }
        }
        tracing::info!("connection manager stopped");
    }

    /// Services commands while the single retry timer runs.
    ///
    /// Returns `true` if a stop arrived (the timer is abandoned and no
    /// further dial happens).
    async fn wait_retry(&mut self, delay: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return false,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(envelope)) => {
                        tracing::warn!(
                            kind = %envelope.kind,
                            "not connected, dropping outbound message"
                        );
                    }
                    Some(Command::Stop) | None => return true,
                },
            }
        }
    }

    /// Drives one live connection: inbound frames fan out to the
    /// registry, outbound commands go to the socket.
    ///
    /// Returns `true` if a stop ended the connection, `false` if the
    /// transport did (which re-enters the retry cycle).
    async fn drive(&mut self, mut conn: C::Connection) -> bool {
        loop {
            tokio::select! {
                frame = conn.recv() => match frame {
                    Ok(Some(text)) => self.dispatch(&text),
                    Ok(None) => {
                        tracing::info!(conn = %conn.id(), "connection closed by server");
                        return false;
                    }
                    Err(e) => {
                        tracing::warn!(conn = %conn.id(), error = %e, "receive failed");
                        return false;
                    }
                },
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(envelope)) => {
                        let text = match self.codec.encode(&envelope) {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::error!(
                                    kind = %envelope.kind,
                                    error = %e,
                                    "encode failed, dropping message"
                                );
                                continue;
                            }
                        };
                        if let Err(e) = conn.send(&text).await {
                            // The message is lost, not buffered.
                            tracing::warn!(
                                conn = %conn.id(),
                                kind = %envelope.kind,
                                error = %e,
                                "send failed, reconnecting"
                            );
                            return false;
                        }
                        tracing::trace!(kind = %envelope.kind, "message sent");
                    }
                    Some(Command::Stop) | None => {
                        let _ = conn.close().await;
                        return true;
                    }
                },
            }
        }
    }

    /// Decodes one inbound frame and fans it out. Malformed frames are
    /// logged and dropped without touching the listener set.
    fn dispatch(&self, text: &str) {
        match self.codec.decode::<Envelope>(text) {
            Ok(envelope) => {
                tracing::trace!(kind = %envelope.kind, "message received");
                self.registry.dispatch(&envelope);
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
            }
        }
    }
}
