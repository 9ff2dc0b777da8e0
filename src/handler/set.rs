//! Handler set builder
//!
//! A ready-made [`ResponseHandlers`] assembled with a fluent API.

use std::sync::Arc;

use crate::protocol::{PayloadReader, Tag};

use super::{HandlerMember, ResponseCallback, ResponseHandlers, UnroutedCallback};

/// Fluent collection of handler members, manual bindings and an unrouted hook
pub struct HandlerSet<R: Tag> {
    members: Vec<HandlerMember<R>>,
    manual: Vec<(R, ResponseCallback<R>)>,
    unrouted: Option<UnroutedCallback>,
}

impl<R: Tag> HandlerSet<R> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            manual: Vec::new(),
            unrouted: None,
        }
    }

    /// Add a member bound by naming convention
    pub fn on<F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(R, &mut PayloadReader) + Send + Sync + 'static,
    {
        self.members.push(HandlerMember::named(name, callback));
        self
    }

    /// Add a member bound to explicit tags
    pub fn on_tags<F>(mut self, name: impl Into<String>, tags: &[R], callback: F) -> Self
    where
        F: Fn(R, &mut PayloadReader) + Send + Sync + 'static,
    {
        self.members.push(HandlerMember::annotated(name, tags, callback));
        self
    }

    /// Add a manual binding, applied after the members
    pub fn manual<F>(mut self, tag: R, callback: F) -> Self
    where
        F: Fn(R, &mut PayloadReader) + Send + Sync + 'static,
    {
        self.manual.push((tag, Arc::new(callback)));
        self
    }

    /// Receive payloads no binding or sentinel claimed
    pub fn unrouted<F>(mut self, callback: F) -> Self
    where
        F: Fn(PayloadReader) + Send + Sync + 'static,
    {
        self.unrouted = Some(Arc::new(callback));
        self
    }
}

impl<R: Tag> Default for HandlerSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Tag> ResponseHandlers<R> for HandlerSet<R> {
    fn members(&self) -> Vec<HandlerMember<R>> {
        self.members.clone()
    }

    fn manual_bindings(&self) -> Vec<(R, ResponseCallback<R>)> {
        self.manual.clone()
    }

    fn attend_unrouted(&self, payload: PayloadReader) {
        if let Some(hook) = &self.unrouted {
            hook(payload);
        }
    }
}
