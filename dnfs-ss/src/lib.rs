//! DNFS Storage Server: per-file coarse/fine locking, the sentence-level
//! WRITE transaction protocol, undo, checkpoints, replication and
//! recovery (§4.3, §4.4).
//!
//! A Storage Server never talks to other clients' sessions directly; it
//! only ever serves the file it's asked about, resolved in advance by
//! the Name Server.

pub mod checkpoint;
mod config;
pub mod delete;
pub mod error;
pub mod exec;
pub mod incoming;
pub mod locks;
pub mod metadata;
pub mod paths;
pub mod readstream;
pub mod recovery;
pub mod repl;
pub mod server;
pub mod text;
pub mod undo;
pub mod write;

pub use config::Config;
pub use error::{Error, Result};
pub use server::SsState;
