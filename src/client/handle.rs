//! Deferred response handle

use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{Result, WireError};

/// Result of a send running on another thread
#[derive(Debug)]
pub struct ResponseHandle<T> {
    rx: Receiver<Result<T>>,
}

impl<T> ResponseHandle<T> {
    pub(crate) fn new(rx: Receiver<Result<T>>) -> Self {
        Self { rx }
    }

    /// Block until the response (or failure) arrives
    pub fn wait(self) -> Result<T> {
        self.rx.recv().map_err(|_| WireError::Disconnected)?
    }

    /// Take the result if it is already available
    pub fn try_wait(&self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(WireError::Disconnected)),
        }
    }

    /// Wait at most `timeout`; `None` if nothing arrived in time
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(WireError::Disconnected)),
        }
    }
}
