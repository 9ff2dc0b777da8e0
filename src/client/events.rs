//! Client notifications
//!
//! Events published by the dispatch loop to observers and channel subscribers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use crate::protocol::Tag;

use super::panic_message;

/// Where a server-error notification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// The peer sent the error sentinel
    Peer,

    /// Handling an inbound frame failed locally
    Dispatch,
}

/// Something the dispatch loop observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent<C: Tag> {
    /// The peer has nothing mapped to a command we issued
    NotMapped { command: C },

    /// The peer did not recognise a command we issued
    Unknown { payload: Bytes },

    /// The peer reported an error, or a frame could not be handled
    ServerError { message: String, origin: ErrorOrigin },

    /// Reading from the transport failed; the dispatch loop has stopped
    ConnectionLost { error: String },

    /// The stream was closed; the dispatch loop has stopped
    Closed,
}

type Observer<C> = Arc<dyn Fn(&ClientEvent<C>) + Send + Sync>;

/// Fan-out point for client events
pub struct EventHub<C: Tag> {
    /// Called synchronously on the publishing thread, in registration order
    observers: RwLock<Vec<Observer<C>>>,

    /// Channel subscribers; disconnected ones are pruned on publish
    subscribers: Mutex<Vec<Sender<ClientEvent<C>>>>,
}

impl<C: Tag> EventHub<C> {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback invoked for every event
    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(&ClientEvent<C>) + Send + Sync + 'static,
    {
        self.observers.write().push(Arc::new(observer));
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> Receiver<ClientEvent<C>> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver an event to observers, then subscribers
    pub fn publish(&self, event: ClientEvent<C>) {
        tracing::trace!("Publishing {:?}", event);

        let observers: Vec<Observer<C>> = self.observers.read().clone();
        for observer in observers {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| observer(&event))) {
                tracing::warn!("Event observer panicked: {}", panic_message(payload.as_ref()));
            }
        }

        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl<C: Tag> Default for EventHub<C> {
    fn default() -> Self {
        Self::new()
    }
}
