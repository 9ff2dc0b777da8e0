//! Demo protocol
//!
//! A small command set and a matching peer, used by the bundled binaries
//! and the end-to-end tests.
//!
//! ### Commands
//! - 0x01: PING      - reply `Pong`
//! - 0x02: ECHO      - reply `Echo` with the same payload
//! - 0x03: JOIN      - string set in, `Joined` with the strings joined by spaces
//! - 0x04: SUBSCRIBE - reply `Pong`, then push an unsolicited `Notice`
//! - 0x05: FAIL      - reply with the `Error` sentinel
//! - 0x06: LEGACY    - reply with the `NotMapped` sentinel

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::{codec, decode_frame, encode_frame, Frame, Payload, Tag};
use crate::transform::TransformPipeline;
use crate::transport::{Connection, MessageReader, MessageWriter};

crate::protocol_tags! {
    /// Commands understood by the demo peer
    pub enum DemoCommand: u8 {
        Ping = 0x01,
        Echo = 0x02,
        Join = 0x03,
        Subscribe = 0x04,
        Fail = 0x05,
        Legacy = 0x06,
    }
}

crate::protocol_tags! {
    /// Responses produced by the demo peer
    pub enum DemoResponse: u16 {
        Pong = 0x0001,
        Echo = 0x0002,
        Joined = 0x0003,
        Notice = 0x0004,
        #[sentinel(NotMapped)]
        NotMapped = 0xFFFD,
        #[sentinel(Unknown)]
        Unknown = 0xFFFE,
        #[sentinel(Error)]
        Error = 0xFFFF,
    }
}

/// Payload of the notice pushed after `Subscribe`
pub const NOTICE_TEXT: &str = "subscribed";

/// Replies to one inbound message, in send order
///
/// Malformed commands are answered with the `Unknown` sentinel instead of
/// failing.
pub fn respond(message: Bytes) -> Vec<Frame<DemoResponse>> {
    let frame = match decode_frame::<DemoCommand>(message.clone(), true) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!("Unrecognised command: {}", e);
            let (token, body) = codec::split_token(message, true);
            return vec![Frame::new(DemoResponse::Unknown, token, body)];
        }
    };

    let token = frame.token;
    match frame.tag {
        DemoCommand::Ping => vec![Frame::new(DemoResponse::Pong, token, Bytes::new())],
        DemoCommand::Echo => vec![Frame::new(DemoResponse::Echo, token, frame.payload)],
        DemoCommand::Join => match frame.reader().read_strings() {
            Ok(strings) => vec![Frame::new(
                DemoResponse::Joined,
                token,
                Bytes::from(strings.join(" ")),
            )],
            Err(e) => vec![Frame::new(DemoResponse::Error, None, Bytes::from(e.to_string()))],
        },
        DemoCommand::Subscribe => vec![
            Frame::new(DemoResponse::Pong, token, Bytes::new()),
            Frame::new(DemoResponse::Notice, None, Bytes::from_static(NOTICE_TEXT.as_bytes())),
        ],
        DemoCommand::Fail => vec![Frame::new(
            DemoResponse::Error,
            None,
            Bytes::from_static(b"requested failure"),
        )],
        DemoCommand::Legacy => vec![Frame::new(
            DemoResponse::NotMapped,
            None,
            Payload::tagged(frame.tag, &[]).into_bytes(),
        )],
    }
}

/// Serve one connection until the client closes it
pub fn serve<Conn: Connection>(connection: Conn, pipeline: &TransformPipeline) -> Result<()> {
    let (mut reader, mut writer) = connection.split()?;

    loop {
        let message = reader.read_message()?;
        if message.is_empty() {
            writer.close()?;
            return Ok(());
        }

        let plain = pipeline.decode(Bytes::from(message))?;
        for reply in respond(plain) {
            tracing::trace!("Replying {} to token {:?}", reply.tag.name(), reply.token);
            let bytes = encode_frame(reply.tag, reply.token, &reply.payload);
            writer.write_message(&pipeline.encode(bytes)?)?;
        }
    }
}
