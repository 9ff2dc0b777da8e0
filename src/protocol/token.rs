//! Correlation tokens
//!
//! A token ties an outgoing command to the response that answers it.

use std::fmt;

use uuid::Uuid;

/// 128-bit random correlation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(Uuid);

impl Token {
    /// Encoded size in bytes
    pub const LEN: usize = 16;

    /// Generate a new random token
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build a token from its wire bytes
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Wire bytes of the token
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
