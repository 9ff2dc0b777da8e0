//! Transport Module
//!
//! Message-oriented access to an already-open byte stream.
//!
//! ## Architecture
//! - A `Connection` splits into one reader and one writer
//! - The reader is owned by the client's dispatch thread
//! - The writer is shared by callers behind a mutex
//! - A zero-length message means the peer closed the stream

mod tcp;
mod memory;

use std::io;

use crate::error::Result;

pub use tcp::{TcpConnection, TcpReader, TcpWriter, LENGTH_PREFIX_SIZE};
pub use memory::{MemoryConnection, MemoryReader, MemoryWriter};

/// Blocking read side of a connection
pub trait MessageReader: Send + 'static {
    /// Read one whole message
    ///
    /// Returns an empty message once the stream has been closed.
    fn read_message(&mut self) -> io::Result<Vec<u8>>;
}

/// Blocking write side of a connection
pub trait MessageWriter: Send + 'static {
    /// Write one whole message
    fn write_message(&mut self, message: &[u8]) -> io::Result<()>;

    /// Whether the stream still accepts writes
    fn is_available(&self) -> bool;

    /// Close the stream; the local reader then observes end of stream
    fn close(&mut self) -> io::Result<()>;
}

/// An open stream that can be split into independent halves
pub trait Connection: Send + 'static {
    type Reader: MessageReader;
    type Writer: MessageWriter;

    fn split(self) -> Result<(Self::Reader, Self::Writer)>;
}
