//! Fixed-layout payload structs, one per message class in §4.1.
//!
//! Each type exposes `encode(&self) -> Vec<u8>` and
//! `decode(buf: &[u8]) -> Result<Self>`. Fields that are "strings" on the
//! wire are fixed-width and NUL-terminated (see [`crate::primitive`]);
//! in memory they are plain owned `String`s.

mod client_ns;
mod client_ss;
mod common;
mod ns_ss;
mod recovery;
mod ss_ss;

pub use client_ns::*;
pub use client_ss::*;
pub use common::*;
pub use ns_ss::*;
pub use recovery::*;
pub use ss_ss::*;
