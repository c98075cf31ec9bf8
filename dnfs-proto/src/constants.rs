//! Compile-time protocol constants, carried over from the original
//! `protocol.h` layout (§4.1, §6).

/// Name Server port for client connections.
pub const NS_CLIENT_PORT: u16 = 8080;
/// Name Server port for Storage Server registration/control.
pub const NS_SS_PORT: u16 = 8081;

/// Maximum bytes in a single chunked payload (READ/STREAM/EXEC content).
pub const MAX_PAYLOAD: usize = 4096;
/// Maximum bytes in a fixed-width username field.
pub const MAX_USERNAME: usize = 64;
/// Maximum bytes in a fixed-width filename field.
pub const MAX_FILENAME: usize = 256;
/// Maximum bytes in a fixed-width path field.
pub const MAX_PATH: usize = 1024;
/// Maximum bytes in a fixed-width checkpoint tag field.
pub const MAX_TAG: usize = 64;

/// Interval between SS -> NS heartbeat messages, in seconds.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 5;
/// Age after which the NS heartbeat monitor marks an SS offline, in seconds.
pub const HEARTBEAT_TIMEOUT_SECS: u64 = 15;

/// Maximum replication attempts for a single queued job before it is dropped.
pub const MAX_REPLICATION_RETRIES: u32 = 5;

/// Capacity of the NS file->SS resolution LRU cache (§4.5).
pub const NS_CACHE_CAPACITY: usize = 128;

/// Approximate pacing between words sent by STREAM, in milliseconds.
pub const STREAM_WORD_PACING_MS: u64 = 100;
