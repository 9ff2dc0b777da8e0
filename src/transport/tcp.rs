//! TCP Connection
//!
//! Length-prefixed messages over a `TcpStream`.
//!
//! ## Message Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │           Message           │
//! └──────────┴─────────────────────────────┘
//! ```

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use crate::error::Result;
use crate::protocol::codec::MAX_FRAME_SIZE;

use super::{Connection, MessageReader, MessageWriter};

/// Length prefix size
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// An open TCP stream carrying length-prefixed messages
pub struct TcpConnection {
    stream: TcpStream,

    /// Largest message accepted from the peer
    max_message_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpConnection {
    /// Wrap an open stream
    pub fn new(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            max_message_size: MAX_FRAME_SIZE,
            peer_addr,
        })
    }

    /// Connect to `addr`
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::new(TcpStream::connect(addr)?)
    }

    /// Set the largest message accepted from the peer
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Connection for TcpConnection {
    type Reader = TcpReader;
    type Writer = TcpWriter;

    fn split(self) -> Result<(TcpReader, TcpWriter)> {
        // Clone stream for separate read/write handles
        let read_stream = self.stream.try_clone()?;
        let write_stream = self.stream;

        let reader = TcpReader {
            reader: BufReader::new(read_stream),
            max_message_size: self.max_message_size,
            peer_addr: self.peer_addr.clone(),
        };
        let writer = TcpWriter {
            writer: BufWriter::new(write_stream),
            open: true,
            peer_addr: self.peer_addr,
        };
        Ok((reader, writer))
    }
}

/// Read half of a [`TcpConnection`]
pub struct TcpReader {
    reader: BufReader<TcpStream>,
    max_message_size: usize,
    peer_addr: String,
}

impl MessageReader for TcpReader {
    fn read_message(&mut self) -> io::Result<Vec<u8>> {
        let mut header = [0u8; LENGTH_PREFIX_SIZE];

        // Only EOF at a message boundary is a clean close
        loop {
            match self.reader.read(&mut header[..1]) {
                Ok(0) => {
                    tracing::debug!("Peer {} closed the stream", self.peer_addr);
                    return Ok(Vec::new());
                }
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.reader.read_exact(&mut header[1..])?;

        let len = u32::from_be_bytes(header) as usize;
        if len > self.max_message_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Message too large from {}: {} bytes (max {})",
                    self.peer_addr, len, self.max_message_size
                ),
            ));
        }

        let mut message = vec![0u8; len];
        if len > 0 {
            self.reader.read_exact(&mut message)?;
        }
        Ok(message)
    }
}

/// Write half of a [`TcpConnection`]
pub struct TcpWriter {
    writer: BufWriter<TcpStream>,
    open: bool,
    peer_addr: String,
}

impl MessageWriter for TcpWriter {
    fn write_message(&mut self, message: &[u8]) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("Connection to {} is closed", self.peer_addr),
            ));
        }
        let len = u32::try_from(message.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "Message length exceeds u32")
        })?;
        self.writer.write_all(&len.to_be_bytes())?;
        self.writer.write_all(message)?;
        self.writer.flush()
    }

    fn is_available(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> io::Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        let _ = self.writer.flush();

        // Shutting down both halves also wakes the blocked reader
        match self.writer.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e),
        }
    }
}
