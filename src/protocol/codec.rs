//! Protocol codec
//!
//! Encoding and decoding functions for the frame format.
//!
//! ## Wire Format
//!
//! ### Correlated Frame
//! ```text
//! ┌──────────┬─────────────┬──────────┬─────────────────────┐
//! │ Flag (1) │ Token (16)  │ Tag (W)  │       Payload       │
//! └──────────┴─────────────┴──────────┴─────────────────────┘
//! ```
//!
//! ### Plain Frame
//! ```text
//! ┌──────────┬───────────────────────────────────────────────┐
//! │ Tag (W)  │                   Payload                     │
//! └──────────┴───────────────────────────────────────────────┘
//! ```
//!
//! `W` is the byte width of the tag's backing integer. Tags are big-endian.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use super::{Frame, Tag, TagRepr, Token};

/// Value of the flag byte when a token follows
pub const TOKEN_FLAG: u8 = 1;

/// Flag byte + token
pub const TOKEN_PREFIX_SIZE: usize = 1 + Token::LEN;

/// Maximum size of one message on the wire, and of a decompressed frame (16 MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// Encoding
// =============================================================================

/// Append a tag's backing integer to `buf`
pub fn encode_tag<T: Tag, B: BufMut>(tag: T, buf: &mut B) {
    tag.to_repr().put_be(buf);
}

/// Encode a frame to bytes
///
/// With a token: flag (1) + token (16) + tag (W) + payload.
/// Without one: tag (W) + payload.
pub fn encode_frame<T: Tag>(tag: T, token: Option<Token>, payload: &[u8]) -> Bytes {
    let prefix = if token.is_some() { TOKEN_PREFIX_SIZE } else { 0 };
    let mut message = BytesMut::with_capacity(prefix + T::width() + payload.len());

    if let Some(token) = token {
        message.put_u8(TOKEN_FLAG);
        message.put_slice(token.as_bytes());
    }
    encode_tag(tag, &mut message);
    message.put_slice(payload);

    message.freeze()
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a tag from the start of `bytes`
///
/// Fails if the buffer is shorter than the tag width or the value is not a
/// declared variant.
pub fn decode_tag<T: Tag>(bytes: &[u8]) -> Result<T> {
    let width = T::width();
    if bytes.len() < width {
        return Err(WireError::Protocol(format!(
            "Incomplete tag: expected {} bytes, got {}",
            width,
            bytes.len()
        )));
    }

    let repr = <T::Repr as TagRepr>::from_be_slice(&bytes[..width]);
    T::from_repr(repr).ok_or_else(|| {
        WireError::Protocol(format!(
            "Tag value {:?} is not a declared {}",
            repr,
            std::any::type_name::<T>()
        ))
    })
}

/// Split the optional correlation prefix off a frame
///
/// A token is read only when `expect_token` is set, the buffer is longer
/// than the prefix and the flag byte is set; otherwise the whole buffer is
/// returned untouched.
pub fn split_token(bytes: Bytes, expect_token: bool) -> (Option<Token>, Bytes) {
    if expect_token && bytes.len() > TOKEN_PREFIX_SIZE && bytes[0] == TOKEN_FLAG {
        let mut raw = [0u8; Token::LEN];
        raw.copy_from_slice(&bytes[1..TOKEN_PREFIX_SIZE]);
        (Some(Token::from_bytes(raw)), bytes.slice(TOKEN_PREFIX_SIZE..))
    } else {
        (None, bytes)
    }
}

/// Decode a frame from bytes
pub fn decode_frame<T: Tag>(bytes: Bytes, expect_token: bool) -> Result<Frame<T>> {
    let (token, body) = split_token(bytes, expect_token);
    let tag = decode_tag::<T>(&body)?;
    let payload = body.slice(T::width()..);

    Ok(Frame {
        token,
        tag,
        payload,
    })
}
