//! Request/response correlation, layered on the subscribe primitive.
//!
//! The wire protocol has no request ids — a reply is recognized purely
//! by its `type` (see [`royaka_protocol::reply_kind`]). These helpers
//! wrap the pattern every page of the original client hand-rolled:
//! subscribe, filter for one kind, resolve once, unsubscribe. The
//! fan-out contract is untouched; other subscribers still see every
//! message.

use std::sync::Mutex;
use std::time::Duration;

use royaka_protocol::{reply_kind, Envelope};
use tokio::sync::oneshot;

use crate::error::RequestError;
use crate::registry::Subscription;
use crate::Client;

impl Client {
    /// Sends a request and waits for the server's reply of the mapped
    /// kind.
    ///
    /// The reply subscription is registered before the send, so a
    /// fast reply cannot be missed.
    ///
    /// # Errors
    /// - [`RequestError::NotConnected`] — nothing was sent.
    /// - [`RequestError::NoReply`] — `envelope.kind` is fire-and-forget
    ///   (e.g. `find_match`); use [`wait_for`](Self::wait_for) on the
    ///   push kinds instead.
    /// - [`RequestError::Timeout`] — no matching reply in time.
    pub async fn request(
        &self,
        envelope: Envelope,
        timeout: Duration,
    ) -> Result<Envelope, RequestError> {
        let Some(expect) = reply_kind(&envelope.kind) else {
            return Err(RequestError::NoReply {
                kind: envelope.kind,
            });
        };
        if !self.is_connected() {
            return Err(RequestError::NotConnected);
        }

        let (reply_rx, sub) = self.first_match(expect.clone());
        self.send_message(envelope);
        self.await_reply(reply_rx, sub, expect, timeout).await
    }

    /// Waits for the next inbound envelope of `kind`, typically an
    /// unsolicited push (`match_found`, `game_state`, …).
    ///
    /// # Errors
    /// Returns [`RequestError::Timeout`] if nothing of that kind
    /// arrives in time.
    pub async fn wait_for(
        &self,
        kind: &str,
        timeout: Duration,
    ) -> Result<Envelope, RequestError> {
        let (reply_rx, sub) = self.first_match(kind.to_string());
        self.await_reply(reply_rx, sub, kind.to_string(), timeout)
            .await
    }

    /// Registers a one-shot resolver for the first envelope of `kind`.
    fn first_match(
        &self,
        kind: String,
    ) -> (oneshot::Receiver<Envelope>, Subscription) {
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));
        let sub = self.subscribe(move |envelope| {
            if envelope.kind != kind {
                return;
            }
            let taken = slot
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take();
            if let Some(tx) = taken {
                // The receiver may already be gone (timeout raced the
                // reply); that's fine, the message still fanned out.
                let _ = tx.send(envelope.clone());
            }
        });
        (rx, sub)
    }

    async fn await_reply(
        &self,
        reply_rx: oneshot::Receiver<Envelope>,
        sub: Subscription,
        kind: String,
        timeout: Duration,
    ) -> Result<Envelope, RequestError> {
        let result = tokio::time::timeout(timeout, reply_rx).await;
        sub.unsubscribe();
        match result {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(_)) => Err(RequestError::Stopped { kind }),
            Err(_) => Err(RequestError::Timeout { kind }),
        }
    }
}
