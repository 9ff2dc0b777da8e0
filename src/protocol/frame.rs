//! Frame definitions
//!
//! One decoded unit of wire data.

use bytes::Bytes;

use super::{PayloadReader, Tag, Token};

/// A decoded frame: optional correlation token, tag and payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<T: Tag> {
    /// Correlation token, present only when the sender flagged one
    pub token: Option<Token>,

    /// Command or response discriminator
    pub tag: T,

    /// Bytes following the tag
    pub payload: Bytes,
}

impl<T: Tag> Frame<T> {
    /// Create a frame
    pub fn new(tag: T, token: Option<Token>, payload: impl Into<Bytes>) -> Self {
        Self {
            token,
            tag,
            payload: payload.into(),
        }
    }

    /// Whether the frame carries a correlation token
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Reader positioned at the start of the payload
    pub fn reader(&self) -> PayloadReader {
        PayloadReader::new(self.payload.clone())
    }
}
