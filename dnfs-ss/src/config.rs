//! Optional `dnfs-ss.toml` tunables (§6's "none required" startup
//! argument rule; only internal constants are adjustable here).

use std::path::Path;

use serde::Deserialize;

use dnfs_proto::constants::HEARTBEAT_INTERVAL_SECS;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ns_host: String,
    pub ns_control_port: u16,
    /// IP this SS advertises to the NS in its REGISTER payload; must be
    /// reachable by clients and by other storage servers.
    pub advertise_ip: String,
    pub client_port: u16,
    pub replication_port: u16,
    pub data_dir: String,
    pub heartbeat_interval_secs: u64,
    pub metadata_checkpoint_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ns_host: "127.0.0.1".to_string(),
            ns_control_port: dnfs_proto::constants::NS_SS_PORT,
            advertise_ip: "127.0.0.1".to_string(),
            client_port: 9000,
            replication_port: 9001,
            data_dir: ".".to_string(),
            heartbeat_interval_secs: HEARTBEAT_INTERVAL_SECS,
            metadata_checkpoint_secs: 60,
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
            Err(_) => Config::default(),
        }
    }
}
