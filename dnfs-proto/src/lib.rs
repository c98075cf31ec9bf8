//! Wire protocol for DNFS: a length-prefixed, fixed-layout binary framing
//! shared by the client, Name Server (NS) and Storage Servers (SS).
//!
//! Every message is a [`MsgHeader`] (`{msg_type: u32, payload_len: u32}`,
//! little-endian) followed by exactly `payload_len` bytes of a
//! type-determined payload. This crate owns encode/decode only; it does not
//! open sockets.

pub mod constants;
mod error;
mod framing;
pub mod message;
pub mod payloads;
mod primitive;

pub use error::Error;
pub use framing::{read_message, write_message};
pub use message::MsgType;
pub use primitive::{read_fixed_str, write_fixed_str};

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
