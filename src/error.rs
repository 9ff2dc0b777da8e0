//! Error types for tagwire
//!
//! Provides a unified error type for all operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using WireError
pub type Result<T> = std::result::Result<T, WireError>;

/// Unified error type for tagwire operations
#[derive(Debug, Error)]
pub enum WireError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection is no longer available")]
    Disconnected,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Handler binding already exists for {0}")]
    BindingExists(String),

    // -------------------------------------------------------------------------
    // Transform Errors
    // -------------------------------------------------------------------------
    #[error("Encryption state error: {0}")]
    EncryptionState(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Compression error: {0}")]
    Compression(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Request aborted: {0}")]
    Aborted(AbortReason),

    #[error("Callback panicked: {0}")]
    CallbackPanic(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for WireError {
    fn from(err: bincode::Error) -> Self {
        WireError::Serialization(err.to_string())
    }
}

/// Why an outstanding request was released without a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The peer answered with the error sentinel
    ServerError,

    /// The transport failed while the request was in flight
    ConnectionLost,

    /// The connection was closed while the request was in flight
    Closed,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::ServerError => f.write_str("server reported an error"),
            AbortReason::ConnectionLost => f.write_str("connection lost"),
            AbortReason::Closed => f.write_str("connection closed"),
        }
    }
}
