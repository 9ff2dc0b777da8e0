//! Pending request table
//!
//! In-flight correlated commands keyed by token.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::error::AbortReason;
use crate::protocol::{PayloadReader, Tag, Token};

/// Invoked once with the matching response
pub type ResponseFn<R> = Box<dyn FnOnce(R, &mut PayloadReader) + Send>;

/// Invoked instead of the response callback when the request is aborted
pub type AbortFn = Box<dyn FnOnce(AbortReason) + Send>;

/// One in-flight request
pub struct PendingRequest<R: Tag> {
    on_response: ResponseFn<R>,
    on_abort: Option<AbortFn>,
}

impl<R: Tag> PendingRequest<R> {
    /// A request answered by `on_response`
    pub fn new<F>(on_response: F) -> Self
    where
        F: FnOnce(R, &mut PayloadReader) + Send + 'static,
    {
        Self {
            on_response: Box::new(on_response),
            on_abort: None,
        }
    }

    /// Release a waiter when the request is aborted
    pub fn with_abort<F>(mut self, on_abort: F) -> Self
    where
        F: FnOnce(AbortReason) + Send + 'static,
    {
        self.on_abort = Some(Box::new(on_abort));
        self
    }
}

impl<R: Tag> fmt::Debug for PendingRequest<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("abortable", &self.on_abort.is_some())
            .finish()
    }
}

/// Token → pending request map shared by callers and the dispatch thread
///
/// ## Concurrency:
/// - Callers insert on send; the dispatch thread removes on receive
/// - Callbacks always run after the entry left the map and the lock is released
pub struct PendingTable<R: Tag> {
    requests: Mutex<HashMap<Token, PendingRequest<R>>>,
}

impl<R: Tag> PendingTable<R> {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a request
    ///
    /// Returns false, leaving the existing entry in place, if the token is
    /// already registered.
    pub fn register(&self, token: Token, request: PendingRequest<R>) -> bool {
        let mut requests = self.requests.lock();
        if requests.contains_key(&token) {
            tracing::warn!("Token {} is already pending, ignoring registration", token);
            return false;
        }
        requests.insert(token, request);
        true
    }

    /// Deliver a response to the request registered under `token`
    ///
    /// Returns whether a request was waiting for it.
    pub fn complete(&self, token: Token, tag: R, payload: &mut PayloadReader) -> bool {
        let request = self.requests.lock().remove(&token);
        match request {
            Some(request) => {
                tracing::trace!("Completing request {} with {:?}", token, tag);
                (request.on_response)(tag, payload);
                true
            }
            None => false,
        }
    }

    /// Drop a request without invoking either callback
    pub fn remove(&self, token: Token) -> bool {
        self.requests.lock().remove(&token).is_some()
    }

    /// Release every outstanding request without a response
    ///
    /// Response callbacks are dropped unused. Returns the number released.
    pub fn abort_all(&self, reason: AbortReason) -> usize {
        let drained: Vec<_> = self.requests.lock().drain().collect();
        let count = drained.len();

        for (_, request) in drained {
            if let Some(on_abort) = request.on_abort {
                on_abort(reason);
            }
        }

        if count > 0 {
            tracing::debug!("Aborted {} pending requests: {}", count, reason);
        }
        count
    }

    pub fn contains(&self, token: Token) -> bool {
        self.requests.lock().contains_key(&token)
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}

impl<R: Tag> Default for PendingTable<R> {
    fn default() -> Self {
        Self::new()
    }
}
