//! Transform Module
//!
//! Optional compression and encryption around encoded frames.
//!
//! ## Ordering
//! ```text
//! outbound:  frame ──► compress ──► encrypt ──► wire
//! inbound:   wire  ──► decrypt  ──► decompress ──► frame
//! ```
//!
//! A disabled stage passes bytes through unchanged. With encryption enabled,
//! every encode/decode fails until a session key is installed.

mod compression;
mod encryption;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::config::ClientConfig;
use crate::error::{Result, WireError};
use crate::protocol::codec::MAX_FRAME_SIZE;

pub use compression::{compress, decompress};
pub use encryption::{decrypt, encrypt, SessionKey, AUTH_TAG_SIZE, NONCE_SIZE};

/// Compression and encryption applied around the frame codec
#[derive(Debug)]
pub struct TransformPipeline {
    /// Zstd level, `None` when compression is off
    compression: Option<i32>,

    /// Whether the encryption stage is on
    encryption: bool,

    /// Key for the encryption stage; may be installed after construction
    session_key: RwLock<Option<SessionKey>>,
}

impl TransformPipeline {
    /// Create a pipeline with the given stages
    pub fn new(compression: Option<i32>, encryption: bool) -> Self {
        Self {
            compression,
            encryption,
            session_key: RwLock::new(None),
        }
    }

    /// A pipeline with both stages off
    pub fn identity() -> Self {
        Self::new(None, false)
    }

    /// Build the stages a client config asks for
    pub fn from_config(config: &ClientConfig) -> Self {
        let compression = config.compression.then_some(config.compression_level);
        let pipeline = Self::new(compression, config.encryption);
        match &config.session_key {
            Some(key) => pipeline.with_session_key(key.clone()),
            None => pipeline,
        }
    }

    /// Install a session key at construction
    pub fn with_session_key(self, key: SessionKey) -> Self {
        *self.session_key.write() = Some(key);
        self
    }

    /// Install or replace the session key
    pub fn set_session_key(&self, key: SessionKey) {
        *self.session_key.write() = Some(key);
    }

    /// Drop the session key
    pub fn clear_session_key(&self) {
        *self.session_key.write() = None;
    }

    pub fn has_session_key(&self) -> bool {
        self.session_key.read().is_some()
    }

    pub fn compression_enabled(&self) -> bool {
        self.compression.is_some()
    }

    pub fn encryption_enabled(&self) -> bool {
        self.encryption
    }

    /// Compress, then encrypt
    pub fn encode(&self, frame: Bytes) -> Result<Bytes> {
        let mut bytes = frame;

        if let Some(level) = self.compression {
            bytes = Bytes::from(compress(&bytes, level)?);
        }

        if self.encryption {
            let key = self.session_key.read();
            let key = key.as_ref().ok_or_else(|| {
                WireError::EncryptionState("cannot encrypt before a session key is established".to_string())
            })?;
            bytes = Bytes::from(encrypt(key, &bytes)?);
        }

        Ok(bytes)
    }

    /// Decrypt, then decompress
    pub fn decode(&self, wire: Bytes) -> Result<Bytes> {
        let mut bytes = wire;

        if self.encryption {
            let key = self.session_key.read();
            let key = key.as_ref().ok_or_else(|| {
                WireError::EncryptionState("cannot decrypt before a session key is established".to_string())
            })?;
            bytes = Bytes::from(decrypt(key, &bytes)?);
        }

        if self.compression.is_some() {
            bytes = Bytes::from(decompress(&bytes, MAX_FRAME_SIZE)?);
        }

        Ok(bytes)
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::identity()
    }
}
