//! Sentinel discovery
//!
//! Finds the response variants marked as error / unknown / not-mapped.

use crate::error::{Result, WireError};
use crate::protocol::{Sentinel, Tag};

/// Resolved sentinel tags for one response enumeration
///
/// `unknown` falls back to `error`, and `not_mapped` to `unknown`, when the
/// enumeration does not declare them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinels<R: Tag> {
    pub error: Option<R>,
    pub unknown: Option<R>,
    pub not_mapped: Option<R>,
}

impl<R: Tag> Sentinels<R> {
    /// Scan `R::ALL` for sentinel markers
    ///
    /// Two variants carrying the same marker is a protocol definition error.
    pub fn discover() -> Result<Self> {
        let mut error = None;
        let mut unknown = None;
        let mut not_mapped = None;

        for &tag in R::ALL {
            let Some(kind) = tag.sentinel() else {
                continue;
            };

            let slot = match kind {
                Sentinel::Error => &mut error,
                Sentinel::Unknown => &mut unknown,
                Sentinel::NotMapped => &mut not_mapped,
            };

            if let Some(existing) = *slot {
                return Err(WireError::Protocol(format!(
                    "{:?} and {:?} are both marked as the {:?} sentinel",
                    existing, tag, kind
                )));
            }
            *slot = Some(tag);
        }

        let unknown = unknown.or(error);
        let not_mapped = not_mapped.or(unknown);

        Ok(Self {
            error,
            unknown,
            not_mapped,
        })
    }

    /// Sentinel role of `tag`, tested not-mapped → unknown → error
    pub fn classify(&self, tag: R) -> Option<Sentinel> {
        if self.not_mapped == Some(tag) {
            Some(Sentinel::NotMapped)
        } else if self.unknown == Some(tag) {
            Some(Sentinel::Unknown)
        } else if self.error == Some(tag) {
            Some(Sentinel::Error)
        } else {
            None
        }
    }
}
