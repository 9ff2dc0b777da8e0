//! Protocol Module
//!
//! Defines the frame format shared by client and peer.
//!
//! ## Frame Format
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
//! ### Tags
//! - Commands and responses are two closed enumerations per protocol
//! - `W` is 1, 2, 4 or 8 bytes depending on the backing integer
//! - Responses may mark variants as `Error`, `Unknown` or `NotMapped` sentinels

mod tag;
mod token;
mod frame;
mod payload;
pub mod codec;

pub use tag::{Sentinel, Tag, TagRepr};
pub use token::Token;
pub use frame::Frame;
pub use payload::{Payload, PayloadReader};
pub use codec::{decode_frame, decode_tag, encode_frame, encode_tag, split_token};
