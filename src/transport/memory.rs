//! In-memory Connection
//!
//! Two connected endpoints backed by crossbeam channels. Used to run a client
//! against an in-process peer.

use std::io;

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::Result;

use super::{Connection, MessageReader, MessageWriter};

/// One end of an in-process connection
pub struct MemoryConnection {
    outbound: Sender<Vec<u8>>,
    inbound: Receiver<Vec<u8>>,
}

impl MemoryConnection {
    /// Create two connected endpoints
    pub fn pair() -> (MemoryConnection, MemoryConnection) {
        let (a_tx, a_rx) = channel::unbounded();
        let (b_tx, b_rx) = channel::unbounded();

        let a = MemoryConnection {
            outbound: b_tx,
            inbound: a_rx,
        };
        let b = MemoryConnection {
            outbound: a_tx,
            inbound: b_rx,
        };
        (a, b)
    }
}

impl Connection for MemoryConnection {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn split(self) -> Result<(MemoryReader, MemoryWriter)> {
        // Dropping the writer's shutdown sender wakes the local reader
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);

        let reader = MemoryReader {
            inbound: self.inbound,
            shutdown: shutdown_rx,
        };
        let writer = MemoryWriter {
            outbound: Some(self.outbound),
            shutdown: Some(shutdown_tx),
        };
        Ok((reader, writer))
    }
}

/// Read half of a [`MemoryConnection`]
pub struct MemoryReader {
    inbound: Receiver<Vec<u8>>,
    shutdown: Receiver<()>,
}

impl MessageReader for MemoryReader {
    fn read_message(&mut self) -> io::Result<Vec<u8>> {
        crossbeam::select! {
            recv(self.inbound) -> message => message.map_err(|_| {
                io::Error::new(io::ErrorKind::ConnectionAborted, "memory peer disconnected")
            }),
            recv(self.shutdown) -> _ => Ok(Vec::new()),
        }
    }
}

/// Write half of a [`MemoryConnection`]
pub struct MemoryWriter {
    outbound: Option<Sender<Vec<u8>>>,
    shutdown: Option<Sender<()>>,
}

impl MessageWriter for MemoryWriter {
    fn write_message(&mut self, message: &[u8]) -> io::Result<()> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "memory connection closed"))?;
        outbound
            .send(message.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "memory peer disconnected"))
    }

    fn is_available(&self) -> bool {
        self.outbound.is_some()
    }

    fn close(&mut self) -> io::Result<()> {
        self.outbound = None;
        self.shutdown = None;
        Ok(())
    }
}
