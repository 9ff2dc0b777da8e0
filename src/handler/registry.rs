//! Handler registry
//!
//! Maps response tags to callbacks. Built once when the client starts and
//! read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use crate::config::ClientConfig;
use crate::error::{Result, WireError};
use crate::protocol::{PayloadReader, Tag};

use super::{ResponseCallback, ResponseHandlers};

/// Where a binding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    /// Member with explicit tag annotations
    Annotation,

    /// Unannotated member whose name matched a tag
    Convention,

    /// Manual override list
    Manual,
}

struct Binding<R: Tag> {
    source: BindingSource,
    origin: String,
    callback: ResponseCallback<R>,
}

/// Response tag → callback table
pub struct HandlerRegistry<R: Tag> {
    bindings: HashMap<R, Binding<R>>,
    skip_duplicates: bool,
}

impl<R: Tag> HandlerRegistry<R> {
    /// An empty registry with the given duplicate policy
    pub fn new(skip_duplicates: bool) -> Self {
        Self {
            bindings: HashMap::new(),
            skip_duplicates,
        }
    }

    /// Build the registry from a handler provider
    ///
    /// Nothing is bound when `config.scan_handlers` is off.
    pub fn build<H>(handlers: &H, config: &ClientConfig) -> Result<Self>
    where
        H: ResponseHandlers<R> + ?Sized,
    {
        let mut registry = Self::new(config.skip_duplicate_bindings);
        if !config.scan_handlers {
            tracing::debug!("Handler scan disabled, registry left empty");
            return Ok(registry);
        }

        for member in handlers.members() {
            if !member.tags().is_empty() {
                for &tag in member.tags() {
                    registry.bind(
                        tag,
                        BindingSource::Annotation,
                        member.name(),
                        member.callback().clone(),
                    )?;
                }
            } else if config.map_by_name {
                match R::from_name(member.name()) {
                    Some(tag) => registry.bind(
                        tag,
                        BindingSource::Convention,
                        member.name(),
                        member.callback().clone(),
                    )?,
                    None => {
                        tracing::trace!("Member {} matches no response tag", member.name())
                    }
                }
            }
        }

        for (tag, callback) in handlers.manual_bindings() {
            registry.bind(tag, BindingSource::Manual, "manual binding", callback)?;
        }

        tracing::debug!("Handler registry built with {} bindings", registry.len());
        Ok(registry)
    }

    /// Add a binding under the registry's duplicate policy
    pub fn bind(
        &mut self,
        tag: R,
        source: BindingSource,
        origin: &str,
        callback: ResponseCallback<R>,
    ) -> Result<()> {
        if let Some(existing) = self.bindings.get(&tag) {
            if self.skip_duplicates {
                tracing::debug!(
                    "Skipping {:?} binding of {:?} from {}, already bound by {}",
                    source,
                    tag,
                    origin,
                    existing.origin
                );
                return Ok(());
            }
            return Err(WireError::BindingExists(format!(
                "{:?} (bound by {}, rebound by {})",
                tag, existing.origin, origin
            )));
        }

        tracing::trace!("Binding {:?} to {} ({:?})", tag, origin, source);
        self.bindings.insert(
            tag,
            Binding {
                source,
                origin: origin.to_string(),
                callback,
            },
        );
        Ok(())
    }

    /// Invoke the binding for `tag`, if any
    ///
    /// Returns whether a binding handled the payload.
    pub fn dispatch(&self, tag: R, payload: &mut PayloadReader) -> bool {
        match self.bindings.get(&tag) {
            Some(binding) => {
                (binding.callback)(tag, payload);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, tag: R) -> bool {
        self.bindings.contains_key(&tag)
    }

    /// Source of the binding for `tag`
    pub fn source(&self, tag: R) -> Option<BindingSource> {
        self.bindings.get(&tag).map(|b| b.source)
    }

    /// Name of the member (or "manual binding") bound to `tag`
    pub fn origin(&self, tag: R) -> Option<&str> {
        self.bindings.get(&tag).map(|b| b.origin.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<R: Tag> fmt::Debug for HandlerRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("tags", &self.bindings.keys().collect::<Vec<_>>())
            .field("skip_duplicates", &self.skip_duplicates)
            .finish()
    }
}
