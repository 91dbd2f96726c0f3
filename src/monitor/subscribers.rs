//! Ordered subscriber registry with snapshot-before-notify semantics
//!
//! Subscribing returns an opaque handle; unsubscribing via the handle is
//! safe at any time, including from inside a callback. Notification walks
//! a snapshot of the registry, so removal during a pass does not affect
//! delivery to the remaining handlers in that pass.

use std::sync::{Arc, Mutex};

/// Opaque handle identifying a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registry of event handlers, notified in insertion order
pub struct SubscriberRegistry<E> {
    inner: Mutex<Inner<E>>,
}

struct Inner<E> {
    next_id: u64,
    // Vec keeps insertion order; ids are never reused
    handlers: Vec<(u64, Handler<E>)>,
}

impl<E> Default for SubscriberRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SubscriberRegistry<E> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 0,
                handlers: Vec::new(),
            }),
        }
    }

    /// Register a handler, returning a handle for later removal
    pub fn subscribe(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> SubscriberId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.push((id, Arc::new(handler)));
        SubscriberId(id)
    }

    /// Remove a handler. Returns false if the handle was already removed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.handlers.len();
        inner.handlers.retain(|(h, _)| *h != id.0);
        inner.handlers.len() != before
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an event to every handler registered at the time of the
    /// call, in insertion order. The lock is not held while handlers run,
    /// so handlers may subscribe or unsubscribe freely.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Handler<E>> = {
            let inner = self.inner.lock().unwrap();
            inner.handlers.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in snapshot {
            handler(event);
        }
    }
}
