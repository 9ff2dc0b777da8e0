//! # tagwire
//!
//! A correlated command/response protocol client over an open byte stream:
//! - Typed command and response tags with fixed-width wire encoding
//! - Optional 128-bit correlation tokens matching responses to requests
//! - Tag-routed handlers for unsolicited responses
//! - Error / unknown / not-mapped sentinel notifications
//! - Optional zstd compression and ChaCha20-Poly1305 encryption
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Caller Threads (send / send_async)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ encode → compress → encrypt
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Connection (one stream)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ decrypt → decompress → decode
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                Dispatch Loop (one thread)                    │
//! └──────┬──────────────────┬───────────────────────┬───────────┘
//!        │                  │                       │
//!        ▼                  ▼                       ▼
//!   ┌──────────┐     ┌─────────────┐        ┌──────────────┐
//!   │ Pending  │     │  Handler    │        │   Sentinel   │
//!   │  Table   │     │  Registry   │        │    Events    │
//!   └──────────┘     └─────────────┘        └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use tagwire::demo::{DemoCommand, DemoResponse};
//! use tagwire::transport::TcpConnection;
//! use tagwire::{ClientConfig, ProtocolClient};
//!
//! # fn main() -> tagwire::Result<()> {
//! let connection = TcpConnection::connect("127.0.0.1:7070")?;
//! let client: ProtocolClient<DemoCommand, DemoResponse> =
//!     ProtocolClient::start(connection, (), ClientConfig::default())?;
//!
//! let reply = client.send(DemoCommand::Ping, (), |tag, _payload| tag)?;
//! assert_eq!(reply, DemoResponse::Pong);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transform;
pub mod handler;
pub mod transport;
pub mod client;
pub mod demo;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AbortReason, Result, WireError};
pub use config::ClientConfig;
pub use client::{ClientEvent, LoopState, ProtocolClient, ResponseHandle};
pub use handler::{HandlerSet, ResponseHandlers};
pub use protocol::{Payload, PayloadReader, Sentinel, Tag, Token};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tagwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
