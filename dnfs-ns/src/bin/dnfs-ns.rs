//! Name Server binary entry point. Takes no required arguments (§6);
//! `--config <path>` optionally points at a `dnfs-ns.toml`.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use dnfs_ns::server::{run_client_acceptor, run_heartbeat_monitor, run_ss_acceptor};
use dnfs_ns::{Config, NsState};

#[derive(Parser)]
#[command(name = "dnfs-ns", about = "DNFS Name Server")]
struct Args {
    /// Path to an optional TOML config file overriding the compiled-in
    /// defaults for ports, cache capacity and heartbeat timing.
    #[arg(long, default_value = "dnfs-ns.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = Config::load(&args.config).await;

    let client_listener = TcpListener::bind(("0.0.0.0", config.client_port)).await?;
    let ss_listener = TcpListener::bind(("0.0.0.0", config.ss_port)).await?;

    let state = Arc::new(NsState::load(config).await.map_err(|err| {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    })?);

    tracing::info!("name server listening for clients and storage servers");

    tokio::select! {
        res = run_client_acceptor(Arc::clone(&state), client_listener) => res,
        res = run_ss_acceptor(Arc::clone(&state), ss_listener) => res,
        _ = run_heartbeat_monitor(Arc::clone(&state)) => Ok(()),
    }
}
