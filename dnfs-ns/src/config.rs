//! Optional `dnfs-ns.toml` tunables, overridable by CLI flags (§6's
//! startup arguments say "none required"; this only adjusts internal
//! constants, never the positional argument surface).

use std::path::Path;

use serde::Deserialize;

use dnfs_proto::constants::{HEARTBEAT_TIMEOUT_SECS, NS_CACHE_CAPACITY, NS_CLIENT_PORT, NS_SS_PORT};

/// Tunable knobs for the Name Server binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client_port: u16,
    pub ss_port: u16,
    pub cache_capacity: usize,
    pub heartbeat_timeout_secs: u64,
    pub users_db_path: String,
    pub permission_db_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_port: NS_CLIENT_PORT,
            ss_port: NS_SS_PORT,
            cache_capacity: NS_CACHE_CAPACITY,
            heartbeat_timeout_secs: HEARTBEAT_TIMEOUT_SECS,
            users_db_path: "users.db".to_string(),
            permission_db_dir: "permission_db".to_string(),
        }
    }
}

impl Config {
    /// Loads `path` if present, falling back to defaults for any field
    /// that file omits.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
            Err(_) => Config::default(),
        }
    }
}
