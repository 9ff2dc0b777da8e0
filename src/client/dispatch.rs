//! Dispatch loop
//!
//! The single reader of a client's connection. Decodes inbound frames and
//! routes each one to a pending request, a handler binding, a sentinel event
//! or the unrouted hook.
//!
//! ## States
//! ```text
//!               ┌──────────┐
//!        ┌─────►│Connected │──── read ok ────┐
//!        │      └────┬─────┘                 │
//!        └───────────┼───────────────────────┘
//!          read error│          empty read
//!                    ▼              │
//!          ┌────────────────┐       ▼
//!          │ ConnectionLost │   ┌────────┐
//!          └────────────────┘   │ Closed │
//!                               └────────┘
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, WireError};
use crate::handler::{HandlerRegistry, ResponseHandlers, Sentinels};
use crate::protocol::{decode_frame, Sentinel, Tag};
use crate::transport::MessageReader;

use super::events::{ClientEvent, ErrorOrigin};
use super::{panic_message, Shared};

/// Lifecycle of a client's dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Reading frames
    Connected,

    /// Terminated by a transport read failure
    ConnectionLost,

    /// Terminated by end of stream or a local close
    Closed,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        self != LoopState::Connected
    }
}

pub(crate) struct DispatchLoop<C: Tag, R: Tag, H, Rd> {
    shared: Arc<Shared<C, R>>,
    registry: HandlerRegistry<R>,
    sentinels: Sentinels<R>,
    handlers: H,
    reader: Rd,
}

impl<C, R, H, Rd> DispatchLoop<C, R, H, Rd>
where
    C: Tag,
    R: Tag,
    H: ResponseHandlers<R>,
    Rd: MessageReader,
{
    pub(crate) fn new(
        shared: Arc<Shared<C, R>>,
        registry: HandlerRegistry<R>,
        sentinels: Sentinels<R>,
        handlers: H,
        reader: Rd,
    ) -> Self {
        Self {
            shared,
            registry,
            sentinels,
            handlers,
            reader,
        }
    }

    /// Read and route frames until the connection ends
    pub(crate) fn run(mut self) -> LoopState {
        tracing::debug!("Dispatch loop started");

        loop {
            let message = match self.reader.read_message() {
                Ok(message) => message,
                Err(e) => {
                    self.on_connection_lost(e.to_string());
                    return LoopState::ConnectionLost;
                }
            };

            if message.is_empty() {
                self.close_connection();
                return LoopState::Closed;
            }

            // User callbacks run inside dispatch; a panic must not end the loop
            let bytes = Bytes::from(message);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(bytes)))
                .unwrap_or_else(|payload| {
                    Err(WireError::CallbackPanic(panic_message(payload.as_ref())))
                });

            if let Err(e) = outcome {
                tracing::warn!("Failed to handle inbound frame: {}", e);
                self.shared.events.publish(ClientEvent::ServerError {
                    message: e.to_string(),
                    origin: ErrorOrigin::Dispatch,
                });
            }
        }
    }

    /// Route one inbound message
    fn dispatch(&self, wire: Bytes) -> Result<()> {
        let bytes = self.shared.pipeline.decode(wire)?;
        let frame = decode_frame::<R>(bytes, self.shared.config.expect_tokens)?;
        tracing::trace!(
            "Received {:?} ({} payload bytes, token: {:?})",
            frame.tag,
            frame.payload.len(),
            frame.token
        );

        if let Some(token) = frame.token {
            if self.shared.pending.complete(token, frame.tag, &mut frame.reader()) {
                return Ok(());
            }
            tracing::debug!("No pending request for token {}, routing by tag", token);
        }

        let mut reader = frame.reader();
        if self.registry.dispatch(frame.tag, &mut reader) {
            return Ok(());
        }

        match self.sentinels.classify(frame.tag) {
            Some(Sentinel::NotMapped) => {
                let command = reader.read_tag::<C>()?;
                self.shared.events.publish(ClientEvent::NotMapped { command });
            }
            Some(Sentinel::Unknown) => {
                self.shared.events.publish(ClientEvent::Unknown {
                    payload: reader.into_remaining(),
                });
            }
            Some(Sentinel::Error) => {
                let message = String::from_utf8_lossy(reader.remaining()).into_owned();
                self.shared.events.publish(ClientEvent::ServerError {
                    message,
                    origin: ErrorOrigin::Peer,
                });
            }
            None => self.handlers.attend_unrouted(reader),
        }

        Ok(())
    }

    fn on_connection_lost(&self, error: String) {
        tracing::warn!("Connection lost: {}", error);
        self.shared.set_state(LoopState::ConnectionLost);
        self.shared.events.publish(ClientEvent::ConnectionLost { error });
    }

    fn close_connection(&self) {
        tracing::debug!("Stream closed, stopping dispatch loop");
        self.shared.set_state(LoopState::Closed);
        if let Err(e) = self.shared.writer.lock().close() {
            tracing::debug!("Error closing connection: {}", e);
        }
        self.shared.events.publish(ClientEvent::Closed);
    }
}
