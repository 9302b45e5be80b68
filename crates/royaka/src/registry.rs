//! The subscriber registry: dynamic registration of inbound-message
//! listeners and the fan-out dispatch loop.
//!
//! # Concurrency note
//!
//! The registry is the only mutable state shared between the connection
//! manager's task and application threads, so it lives behind a std
//! `Mutex`. The lock is held only for registration bookkeeping — never
//! while a listener runs. Dispatch clones a snapshot of the listener
//! list and invokes it lock-free, which is what makes it legal for a
//! listener to subscribe or unsubscribe (even itself) mid-dispatch.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use royaka_protocol::Envelope;

/// A listener invoked with every decoded inbound envelope.
pub(crate) type Listener = Arc<dyn Fn(&Envelope) + Send + Sync + 'static>;

/// Opaque identifier for one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    /// Registration order; dispatch snapshots preserve it.
    listeners: Vec<(SubscriberId, Listener)>,
}

/// The live set of subscribers for one client.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    inner: Mutex<Inner>,
}

impl SubscriberRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Listeners never run under the lock, so a poisoned mutex only
    /// means some other thread died mid-bookkeeping; the map itself is
    /// still coherent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a listener and returns the guard that removes it.
    pub(crate) fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&Envelope) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut inner = self.lock();
            inner.next_id += 1;
            let id = SubscriberId(inner.next_id);
            inner.listeners.push((id, Arc::new(listener)));
            tracing::debug!(%id, total = inner.listeners.len(), "subscriber added");
            id
        };
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Removes a listener by id. Removing an already-removed id is a
    /// no-op.
    fn remove(&self, id: SubscriberId) {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        if inner.listeners.len() < before {
            tracing::debug!(%id, total = inner.listeners.len(), "subscriber removed");
        }
    }

    /// Delivers one envelope to every listener registered at the moment
    /// dispatch begins, in registration order.
    ///
    /// A panicking listener is caught and logged; the remaining
    /// listeners still receive the envelope. Registry mutations made by
    /// listeners take effect from the next dispatch.
    pub(crate) fn dispatch(&self, envelope: &Envelope) {
        let snapshot: Vec<(SubscriberId, Listener)> =
            self.lock().listeners.clone();
        if snapshot.is_empty() {
            tracing::trace!(kind = %envelope.kind, "no subscribers, dropping message");
            return;
        }
        for (id, listener) in snapshot {
            let result =
                catch_unwind(AssertUnwindSafe(|| listener(envelope)));
            if result.is_err() {
                tracing::error!(
                    subscriber = %id,
                    kind = %envelope.kind,
                    "listener panicked during dispatch"
                );
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().listeners.len()
    }
}

/// Guard for one registered listener.
///
/// Dropping the guard (or calling [`unsubscribe`](Self::unsubscribe))
/// removes exactly that listener. The guard holds only a weak reference
/// back to the registry, so it never keeps a stopped client alive.
pub struct Subscription {
    id: SubscriberId,
    registry: Weak<SubscriberRegistry>,
}

impl Subscription {
    /// The id this subscription was registered under.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Removes the listener now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
