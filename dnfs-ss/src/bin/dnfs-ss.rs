//! Storage Server binary entry point. Registers with the Name Server,
//! then serves clients, replication peers and periodic checkpoints
//! until the process is killed (§5).

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use dnfs_ss::locks::FileLockMap;
use dnfs_ss::metadata::MetadataTable;
use dnfs_ss::paths::SsRoot;
use dnfs_ss::repl::{self, BackupConfig};
use dnfs_ss::server::{
    discover_existing_root, register_with_ns, run_client_acceptor, run_control_connection,
    run_metadata_checkpointer, run_replication_acceptor, SsState,
};
use dnfs_ss::Config;

#[derive(Parser)]
#[command(name = "dnfs-ss", about = "DNFS Storage Server")]
struct Args {
    /// Path to an optional TOML config file overriding the compiled-in
    /// defaults for ports and data directory.
    #[arg(long, default_value = "dnfs-ss.toml")]
    config: String,
}

fn io_err(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = Config::load(&args.config).await;
    let advertise_ip = Ipv4Addr::from_str(&config.advertise_ip).map_err(io_err)?;

    let existing_files = match discover_existing_root(&config.data_dir).await {
        Some((id, files)) => {
            tracing::info!(ss_id = id, files = files.len(), "found existing data directory");
            files
        }
        None => Vec::new(),
    };

    let (control_socket, ack) = register_with_ns(&config, advertise_ip, existing_files)
        .await
        .map_err(io_err)?;
    tracing::info!(ss_id = ack.new_ss_id, must_recover = ack.must_recover, "registered with name server");

    let root = SsRoot::new(&config.data_dir, ack.new_ss_id);
    root.ensure_dirs().await?;
    let meta = MetadataTable::load(root.base()).await;

    let root = Arc::new(root);
    let meta = Arc::new(meta);
    let locks = Arc::new(FileLockMap::new());
    let backup = Arc::new(BackupConfig::new());
    let repl_handle = repl::spawn(Arc::clone(&root), Arc::clone(&meta), Arc::clone(&backup));

    let client_listener = TcpListener::bind(("0.0.0.0", config.client_port)).await?;
    let replication_listener = TcpListener::bind(("0.0.0.0", config.replication_port)).await?;

    let state = Arc::new(SsState {
        ss_id: ack.new_ss_id,
        root,
        meta,
        locks,
        backup,
        repl: repl_handle,
        config: config.clone(),
    });

    tracing::info!(
        client_port = config.client_port,
        replication_port = config.replication_port,
        "storage server listening"
    );

    tokio::select! {
        res = run_client_acceptor(Arc::clone(&state), client_listener) => res,
        res = run_replication_acceptor(Arc::clone(&state), replication_listener) => res,
        _ = run_metadata_checkpointer(Arc::clone(&state)) => Ok(()),
        _ = run_control_connection(Arc::clone(&state), control_socket, ack) => Ok(()),
    }
}
