//! Broker coordinator process (spec.md §4.2). Dials the fixed worker pool
//! at startup, then serves the control-plane RPC surface to at most one
//! client at a time.

use std::sync::Arc;

use clap::Parser;

use gol_broker::{Session, WorkerPool};

/// CLI flags (spec.md §6): `--serverAddresses` (whitespace-separated
/// `host:port` worker list, default one address) and `--clientPort`
/// (default 8030).
#[derive(Parser, Debug)]
#[command(name = "broker", about = "Distributed Game of Life broker")]
struct Args {
    #[arg(long = "serverAddresses", default_value = "localhost:8080")]
    server_addresses: String,

    #[arg(long = "clientPort", default_value_t = 8030)]
    client_port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gol_core::init_logging("broker");
    gol_core::install_interrupt_handler("broker");

    let args = Args::parse();
    let addresses: Vec<String> = args
        .server_addresses
        .split_whitespace()
        .map(str::to_owned)
        .collect();
    anyhow::ensure!(!addresses.is_empty(), "--serverAddresses must list at least one worker");

    log::info!("[broker] dialing {} worker(s): {addresses:?}", addresses.len());
    let pool = WorkerPool::dial(&addresses).await?;
    let session = Arc::new(Session::new(pool));

    gol_broker::run(args.client_port, session).await
}
