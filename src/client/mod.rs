//! Client Module
//!
//! The protocol client: correlated sends, deferred sends, and the dispatch
//! thread that answers them.
//!
//! ## Architecture
//! ```text
//!   caller threads                         dispatch thread
//!  ┌──────────────┐                      ┌─────────────────┐
//!  │ send()       │── register token ──► │                 │
//!  │ send_async() │                      │  PendingTable   │◄── token match
//!  │ send_oneway()│── write (mutex) ─┐   │                 │
//!  └──────────────┘                  │   └─────────────────┘
//!                                    ▼            ▲
//!                               ┌─────────┐  read │  ┌─────────────────┐
//!                               │ Writer  │       └──│  DispatchLoop   │──► registry / events
//!                               └─────────┘          └─────────────────┘
//! ```

mod dispatch;
mod events;
mod handle;
mod pending;

use std::any::Any;
use std::io::Read;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam::channel::{self, Receiver};
use parking_lot::Mutex;

use crate::config::ClientConfig;
use crate::error::{AbortReason, Result, WireError};
use crate::handler::{HandlerRegistry, ResponseHandlers, Sentinels};
use crate::protocol::{encode_frame, Payload, PayloadReader, Tag, Token};
use crate::transform::{SessionKey, TransformPipeline};
use crate::transport::{Connection, MessageWriter};

use dispatch::DispatchLoop;

pub use dispatch::LoopState;
pub use events::{ClientEvent, ErrorOrigin, EventHub};
pub use handle::ResponseHandle;
pub use pending::{AbortFn, PendingRequest, PendingTable, ResponseFn};

/// State shared between callers and the dispatch thread
pub(crate) struct Shared<C: Tag, R: Tag> {
    config: ClientConfig,
    pipeline: TransformPipeline,
    writer: Mutex<Box<dyn MessageWriter>>,
    pending: Arc<PendingTable<R>>,
    events: EventHub<C>,
    state: Mutex<LoopState>,
}

impl<C: Tag, R: Tag> Shared<C, R> {
    fn state(&self) -> LoopState {
        *self.state.lock()
    }

    fn set_state(&self, state: LoopState) {
        *self.state.lock() = state;
    }

    /// Encode, transform and write one frame
    fn write_frame(&self, command: C, token: Option<Token>, payload: &[u8]) -> Result<()> {
        let frame = encode_frame(command, token, payload);
        let wire = self.pipeline.encode(frame)?;

        tracing::trace!(
            "Sending {:?} ({} payload bytes, {} on wire, token: {:?})",
            command,
            payload.len(),
            wire.len(),
            token
        );
        self.writer.lock().write_message(&wire)?;
        Ok(())
    }
}

struct ClientInner<C: Tag, R: Tag> {
    shared: Arc<Shared<C, R>>,
    dispatch: Mutex<Option<JoinHandle<LoopState>>>,
    dispatch_thread: ThreadId,
}

impl<C: Tag, R: Tag> Drop for ClientInner<C, R> {
    fn drop(&mut self) {
        // Wakes the dispatch thread, which then exits on its own
        let _ = self.shared.writer.lock().close();
    }
}

/// A command/response client over one connection
///
/// Cloning is cheap; all clones share the connection. The connection is
/// closed when the last clone is dropped.
pub struct ProtocolClient<C: Tag, R: Tag> {
    inner: Arc<ClientInner<C, R>>,
}

impl<C: Tag, R: Tag> Clone for ProtocolClient<C, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Tag, R: Tag> ProtocolClient<C, R> {
    /// Start a client on an open connection
    ///
    /// 1. Resolve the response sentinels
    /// 2. Build the handler registry
    /// 3. Split the connection and install the abort subscriptions
    /// 4. Spawn the dispatch thread
    pub fn start<Conn, H>(connection: Conn, handlers: H, config: ClientConfig) -> Result<Self>
    where
        Conn: Connection,
        H: ResponseHandlers<R>,
    {
        let sentinels = Sentinels::<R>::discover()?;
        let registry = HandlerRegistry::build(&handlers, &config)?;
        let (reader, writer) = connection.split()?;

        let pending = Arc::new(PendingTable::new());
        let events = EventHub::new();

        {
            let pending = Arc::clone(&pending);
            let abort_on_disconnect = config.abort_on_disconnect;
            events.observe(move |event: &ClientEvent<C>| {
                let reason = match event {
                    ClientEvent::ServerError { .. } => AbortReason::ServerError,
                    ClientEvent::ConnectionLost { .. } if abort_on_disconnect => {
                        AbortReason::ConnectionLost
                    }
                    ClientEvent::Closed if abort_on_disconnect => AbortReason::Closed,
                    _ => return,
                };
                pending.abort_all(reason);
            });
        }

        let shared = Arc::new(Shared {
            pipeline: TransformPipeline::from_config(&config),
            config,
            writer: Mutex::new(Box::new(writer) as Box<dyn MessageWriter>),
            pending,
            events,
            state: Mutex::new(LoopState::Connected),
        });

        tracing::debug!(
            "Starting client: {} handler bindings, sentinels {:?}",
            registry.len(),
            sentinels
        );

        let dispatch = DispatchLoop::new(Arc::clone(&shared), registry, sentinels, handlers, reader);
        let handle = thread::Builder::new()
            .name("tagwire-dispatch".to_string())
            .spawn(move || dispatch.run())?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                shared,
                dispatch_thread: handle.thread().id(),
                dispatch: Mutex::new(Some(handle)),
            }),
        })
    }

    fn shared(&self) -> &Shared<C, R> {
        &self.inner.shared
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Send a command and block until its response arrives
    ///
    /// `parse` runs on the dispatch thread with the response tag and payload.
    /// Returns `Aborted` if the request is released without a response.
    ///
    /// Handlers and observers run on the dispatch thread and cannot wait for
    /// a response there; calling `send` from them fails with `Config`.
    pub fn send<T, F>(&self, command: C, payload: impl Into<Payload>, parse: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(R, &mut PayloadReader) -> T + Send + 'static,
    {
        if self.on_dispatch_thread() {
            return Err(WireError::Config(
                "blocking send from the dispatch thread; use send_with_callback".to_string(),
            ));
        }

        let rx = self.submit(command, payload.into(), parse)?;
        // Both senders dropped unused: `parse` panicked on the dispatch thread
        rx.recv()
            .map_err(|_| WireError::Aborted(AbortReason::ServerError))?
    }

    /// Send a command whose payload is everything `reader` yields
    pub fn send_reader<T, F, Rd>(&self, command: C, reader: Rd, parse: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(R, &mut PayloadReader) -> T + Send + 'static,
        Rd: Read,
    {
        self.send(command, Payload::from_reader(reader)?, parse)
    }

    /// Send a command on a background thread and return at once
    pub fn send_async<T, F>(
        &self,
        command: C,
        payload: impl Into<Payload>,
        parse: F,
    ) -> Result<ResponseHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(R, &mut PayloadReader) -> T + Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);
        let client = self.clone();
        let payload = payload.into();

        thread::Builder::new()
            .name("tagwire-send".to_string())
            .spawn(move || {
                let _ = tx.send(client.send(command, payload, parse));
            })?;

        Ok(ResponseHandle::new(rx))
    }

    /// Send a correlated command and return at once
    ///
    /// `callback` runs on the dispatch thread when the response arrives. It
    /// is dropped without being called if the request is aborted.
    pub fn send_with_callback<F>(
        &self,
        command: C,
        payload: impl Into<Payload>,
        callback: F,
    ) -> Result<Token>
    where
        F: FnOnce(R, &mut PayloadReader) + Send + 'static,
    {
        self.request(command, &payload.into(), PendingRequest::new(callback))
    }

    /// Send an uncorrelated command; no response is awaited
    pub fn send_oneway(&self, command: C, payload: impl Into<Payload>) -> Result<()> {
        self.ensure_connected()?;
        self.shared().write_frame(command, None, payload.into().as_bytes())
    }

    /// Register a waiter for a fresh token and write the frame
    fn submit<T, F>(&self, command: C, payload: Payload, parse: F) -> Result<Receiver<Result<T>>>
    where
        T: Send + 'static,
        F: FnOnce(R, &mut PayloadReader) -> T + Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);
        let abort_tx = tx.clone();

        let request = PendingRequest::new(move |tag, reader: &mut PayloadReader| {
            let _ = tx.send(Ok(parse(tag, reader)));
        })
        .with_abort(move |reason| {
            let _ = abort_tx.send(Err(WireError::Aborted(reason)));
        });

        self.request(command, &payload, request)?;
        Ok(rx)
    }

    fn request(&self, command: C, payload: &Payload, request: PendingRequest<R>) -> Result<Token> {
        let shared = self.shared();
        if !shared.config.use_tokens {
            return Err(WireError::Config(
                "correlated sends require use_tokens".to_string(),
            ));
        }
        self.ensure_connected()?;

        let token = Token::generate();
        shared.pending.register(token, request);

        // The loop may have stopped between the check and the registration
        if shared.state().is_terminal() {
            shared.pending.remove(token);
            return Err(WireError::Disconnected);
        }

        if let Err(e) = shared.write_frame(command, Some(token), payload.as_bytes()) {
            shared.pending.remove(token);
            return Err(e);
        }
        Ok(token)
    }

    fn on_dispatch_thread(&self) -> bool {
        thread::current().id() == self.inner.dispatch_thread
    }

    fn ensure_connected(&self) -> Result<()> {
        let shared = self.shared();
        if shared.state().is_terminal() || !shared.writer.lock().is_available() {
            return Err(WireError::Disconnected);
        }
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Receive every client event published from now on
    pub fn subscribe(&self) -> Receiver<ClientEvent<C>> {
        self.shared().events.subscribe()
    }

    /// Run `observer` on the dispatch thread for every event
    pub fn on_event<F>(&self, observer: F)
    where
        F: Fn(&ClientEvent<C>) + Send + Sync + 'static,
    {
        self.shared().events.observe(observer);
    }

    // =========================================================================
    // Session & Lifecycle
    // =========================================================================

    /// Install or replace the encryption session key
    pub fn establish_session_key(&self, key: SessionKey) {
        self.shared().pipeline.set_session_key(key);
    }

    pub fn pipeline(&self) -> &TransformPipeline {
        &self.shared().pipeline
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared().config
    }

    /// Number of correlated requests awaiting a response
    pub fn pending_count(&self) -> usize {
        self.shared().pending.len()
    }

    pub fn state(&self) -> LoopState {
        self.shared().state()
    }

    /// Whether the connection still accepts commands
    pub fn is_available(&self) -> bool {
        self.ensure_connected().is_ok()
    }

    /// Close the connection and wait for the dispatch thread to stop
    ///
    /// When called from the dispatch thread itself the wait is skipped.
    pub fn close(&self) -> Result<()> {
        self.shared().writer.lock().close()?;

        let handle = self.inner.dispatch.lock().take();
        if let Some(handle) = handle {
            if self.on_dispatch_thread() {
                return Ok(());
            }
            let state = handle
                .join()
                .map_err(|_| WireError::Transport("dispatch thread panicked".to_string()))?;
            tracing::debug!("Dispatch loop finished in state {:?}", state);
        }
        Ok(())
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
