//! In-memory transport for hub integration tests.
//!
//! [`MemoryConnector`] scripts dial behavior (fail the first N dials,
//! then succeed) and hands the test a [`ServerHandle`] per successful
//! dial: push frames to the client, read frames the client wrote, and
//! close the connection server-side.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use royaka_transport::{
    Connection, ConnectionId, Connector, TransportError,
};
use tokio::sync::mpsc;

/// The server side of one established mock connection.
pub struct ServerHandle {
    to_client: Option<mpsc::UnboundedSender<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl ServerHandle {
    /// Pushes a frame to the client. Returns `false` if the client
    /// side of this connection no longer exists.
    pub fn push(&self, text: &str) -> bool {
        self.to_client
            .as_ref()
            .map(|tx| tx.send(text.to_string()).is_ok())
            .unwrap_or(false)
    }

    /// The next frame the client wrote, or `None` if the client side
    /// is gone or stays silent for a second.
    pub async fn next_sent(&mut self) -> Option<String> {
        tokio::time::timeout(
            Duration::from_secs(1),
            self.from_client.recv(),
        )
        .await
        .ok()
        .flatten()
    }

    /// Simulates a server-initiated close: the client's next `recv`
    /// returns a clean end-of-stream.
    pub fn close(&mut self) {
        self.to_client = None;
    }
}

struct Inner {
    /// Dials to fail before the first success.
    fail_first: u32,
    attempts: AtomicU32,
    next_id: AtomicU64,
    handles: mpsc::UnboundedSender<ServerHandle>,
}

/// A scriptable [`Connector`] backed by channels instead of sockets.
#[derive(Clone)]
pub struct MemoryConnector {
    inner: Arc<Inner>,
}

impl MemoryConnector {
    /// Returns the connector and the stream of server-side handles,
    /// one per successful dial.
    pub fn new(
        fail_first: u32,
    ) -> (Self, mpsc::UnboundedReceiver<ServerHandle>) {
        let (handles_tx, handles_rx) = mpsc::unbounded_channel();
        let connector = Self {
            inner: Arc::new(Inner {
                fail_first,
                attempts: AtomicU32::new(0),
                next_id: AtomicU64::new(1),
                handles: handles_tx,
            }),
        };
        (connector, handles_rx)
    }

    /// Total dials so far, including failed ones.
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;
    type Error = TransportError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let attempt =
            self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.inner.fail_first {
            return Err(TransportError::ConnectFailed(
                std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "scripted dial failure",
                ),
            ));
        }

        let (to_client_tx, to_client_rx) = mpsc::unbounded_channel();
        let (from_client_tx, from_client_rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new(
            self.inner.next_id.fetch_add(1, Ordering::SeqCst),
        );
        let _ = self.inner.handles.send(ServerHandle {
            to_client: Some(to_client_tx),
            from_client: from_client_rx,
        });
        Ok(MemoryConnection {
            id,
            inbound: to_client_rx,
            outbound: from_client_tx,
        })
    }
}

/// The client side of one established mock connection.
pub struct MemoryConnection {
    id: ConnectionId,
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&mut self, text: &str) -> Result<(), Self::Error> {
        self.outbound.send(text.to_string()).map_err(|_| {
            TransportError::ConnectionClosed(
                "server handle dropped".into(),
            )
        })
    }

    async fn recv(&mut self) -> Result<Option<String>, Self::Error> {
        Ok(self.inbound.recv().await)
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.inbound.close();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Waits for the next established connection's server handle.
pub async fn next_handle(
    handles: &mut mpsc::UnboundedReceiver<ServerHandle>,
) -> ServerHandle {
    tokio::time::timeout(Duration::from_secs(1), handles.recv())
        .await
        .expect("timed out waiting for a connection")
        .expect("connector dropped")
}
