//! DNFS Name Server: directory, access control, placement and recovery
//! coordination for a small distributed file system.
//!
//! The NS never proxies file bytes; it resolves a client's request to a
//! Storage Server endpoint and hands that back, exactly as §2 describes.

pub mod access;
pub mod cache;
mod config;
pub mod error;
pub mod filemap;
pub mod folders;
pub mod recovery;
pub mod server;
pub mod sslist;
pub mod users;

pub use config::Config;
pub use error::{Error, Result};
pub use server::NsState;
