//! Payload helpers
//!
//! Outgoing payload construction and incoming payload reading.
//!
//! ### String Set Layout
//! ```text
//! ┌───────────┬──────────┬──────────┬──────────┬──────────┬─────┐
//! │ Count (4) │ Len (4)  │  UTF-8   │ Len (4)  │  UTF-8   │ ... │
//! └───────────┴──────────┴──────────┴──────────┴──────────┴─────┘
//! ```

use std::io::{self, Read};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, WireError};
use super::{codec, Tag};

// =============================================================================
// Outgoing
// =============================================================================

/// Bytes following the tag in an outgoing frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload(Bytes);

impl Payload {
    /// An empty payload
    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Raw bytes
    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// A length-prefixed set of strings
    ///
    /// Fails if the count or any string length does not fit the u32 prefix.
    pub fn strings<I, S>(strings: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strings: Vec<S> = strings.into_iter().collect();
        let mut buf = BytesMut::new();
        buf.put_u32(length_prefix(strings.len(), "string set")?);
        for s in &strings {
            put_string(&mut buf, s.as_ref())?;
        }
        Ok(Self(buf.freeze()))
    }

    /// Everything a reader yields until EOF
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(Self(Bytes::from(buf)))
    }

    /// A bincode-encoded value
    pub fn value<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self(Bytes::from(bincode::serialize(value)?)))
    }

    /// A tag followed by raw bytes
    pub fn tagged<T: Tag>(tag: T, rest: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(T::width() + rest.len());
        codec::encode_tag(tag, &mut buf);
        buf.put_slice(rest);
        Self(buf.freeze())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}

fn put_string(buf: &mut BytesMut, s: &str) -> Result<()> {
    buf.put_u32(length_prefix(s.len(), "string")?);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn length_prefix(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        WireError::Protocol(format!("{} length {} exceeds the u32 prefix", what, len))
    })
}

// =============================================================================
// Incoming
// =============================================================================

/// Cursor over the payload of a received frame
#[derive(Debug, Clone)]
pub struct PayloadReader {
    buf: Bytes,
}

impl PayloadReader {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take every unread byte
    pub fn into_remaining(self) -> Bytes {
        self.buf
    }

    fn ensure(&self, needed: usize, what: &str) -> Result<()> {
        if self.buf.len() < needed {
            return Err(WireError::Protocol(format!(
                "Payload too short for {}: expected {} bytes, got {}",
                what,
                needed,
                self.buf.len()
            )));
        }
        Ok(())
    }

    /// Read a tag encoded at its declared width
    pub fn read_tag<T: Tag>(&mut self) -> Result<T> {
        let tag = codec::decode_tag::<T>(&self.buf)?;
        self.buf.advance(T::width());
        Ok(tag)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1, "u8")?;
        Ok(self.buf.get_u8())
    }

    /// Read a big-endian u32
    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4, "u32")?;
        Ok(self.buf.get_u32())
    }

    /// Read exactly `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len, "byte block")?;
        Ok(self.buf.split_to(len))
    }

    /// Read a u32-length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let raw = self.read_bytes(len)?;
        String::from_utf8(raw.to_vec())
            .map_err(|e| WireError::Protocol(format!("Invalid UTF-8 in payload string: {}", e)))
    }

    /// Read a string set written by [`Payload::strings`]
    pub fn read_strings(&mut self) -> Result<Vec<String>> {
        let count = self.read_u32()? as usize;
        // Each entry needs at least its length prefix
        self.ensure(count.saturating_mul(4), "string set")?;
        (0..count).map(|_| self.read_string()).collect()
    }

    /// Read a bincode-encoded value
    pub fn read_value<T: DeserializeOwned>(&mut self) -> Result<T> {
        Ok(bincode::deserialize_from(self)?)
    }
}

impl Read for PayloadReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = out.len().min(self.buf.len());
        self.buf.copy_to_slice(&mut out[..n]);
        Ok(n)
    }
}
