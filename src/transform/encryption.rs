//! ChaCha20-Poly1305 encryption stage
//!
//! ## Envelope
//! ```text
//! ┌────────────┬──────────────────────────────┬──────────┐
//! │ Nonce (12) │          Ciphertext          │ Tag (16) │
//! └────────────┴──────────────────────────────┴──────────┘
//! ```

use std::fmt;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use crate::error::{Result, WireError};

/// Nonce prefix size
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size
pub const AUTH_TAG_SIZE: usize = 16;

/// Symmetric key shared by both ends of a connection
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; 32]);

impl SessionKey {
    pub const LEN: usize = 32;

    /// Generate a random key
    pub fn generate() -> Self {
        Self(rand::random())
    }

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Encrypt under a fresh random nonce
pub fn encrypt(key: &SessionKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let nonce_bytes: [u8; NONCE_SIZE] = rand::random();
    let ciphertext = key
        .cipher()
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| WireError::Encryption(format!("encrypt failed: {}", e)))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Verify and decrypt an envelope produced by [`encrypt`]
pub fn decrypt(key: &SessionKey, envelope: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < NONCE_SIZE + AUTH_TAG_SIZE {
        return Err(WireError::Encryption(format!(
            "Envelope too short: expected at least {} bytes, got {}",
            NONCE_SIZE + AUTH_TAG_SIZE,
            envelope.len()
        )));
    }

    let (nonce, ciphertext) = envelope.split_at(NONCE_SIZE);
    key.cipher()
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| WireError::Encryption(format!("decrypt failed: {}", e)))
}
