//! Handler Module
//!
//! Routing of responses that are not answers to a pending request.
//!
//! ## Binding Sources
//! 1. Members with explicit tag annotations
//! 2. Unannotated members whose name matches a response tag (`map_by_name`)
//! 3. The manual override list, applied last
//!
//! All three follow the same duplicate policy: keep the first binding, or
//! fail construction with `BindingExists`.

mod registry;
mod sentinels;
mod set;

use std::fmt;
use std::sync::Arc;

use crate::protocol::{PayloadReader, Tag};

pub use registry::{BindingSource, HandlerRegistry};
pub use sentinels::Sentinels;
pub use set::HandlerSet;

/// Callback invoked with a response tag and a reader over its payload
pub type ResponseCallback<R> = Arc<dyn Fn(R, &mut PayloadReader) + Send + Sync>;

/// Callback for payloads nothing else claimed
pub type UnroutedCallback = Arc<dyn Fn(PayloadReader) + Send + Sync>;

/// A handler offered to the registry
///
/// A member either names the tags it answers explicitly, or leaves them empty
/// and relies on its name matching a response tag.
#[derive(Clone)]
pub struct HandlerMember<R: Tag> {
    name: String,
    tags: Vec<R>,
    callback: ResponseCallback<R>,
}

impl<R: Tag> HandlerMember<R> {
    /// A member bound by naming convention
    pub fn named<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(R, &mut PayloadReader) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tags: Vec::new(),
            callback: Arc::new(callback),
        }
    }

    /// A member bound to explicit tags
    pub fn annotated<F>(name: impl Into<String>, tags: &[R], callback: F) -> Self
    where
        F: Fn(R, &mut PayloadReader) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tags: tags.to_vec(),
            callback: Arc::new(callback),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[R] {
        &self.tags
    }

    pub fn callback(&self) -> &ResponseCallback<R> {
        &self.callback
    }
}

impl<R: Tag> fmt::Debug for HandlerMember<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMember")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Handlers a protocol client routes unsolicited responses to
///
/// Every method has a default, so `()` is a valid empty implementation.
pub trait ResponseHandlers<R: Tag>: Send + Sync + 'static {
    /// Members considered when the registry is built
    fn members(&self) -> Vec<HandlerMember<R>> {
        Vec::new()
    }

    /// Bindings applied after the member scan
    fn manual_bindings(&self) -> Vec<(R, ResponseCallback<R>)> {
        Vec::new()
    }

    /// Receives payloads whose tag has no binding and no sentinel role
    fn attend_unrouted(&self, _payload: PayloadReader) {}
}

impl<R: Tag> ResponseHandlers<R> for () {}
