//! Stripe-compute worker process (spec.md §4.1). Dials nothing; the broker
//! connects to it. Owns no state between calls — every `ComputeStripe` is a
//! pure function of its request.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use gol_wire::{serve_connection, WorkerRequest, WorkerResponse};

/// CLI flags (spec.md §6): `--port`, default 8080 for stripe workers (the
/// legacy single-worker default of 8030 is `gol-broker`'s `--clientPort`
/// default, not this process's).
#[derive(Parser, Debug)]
#[command(name = "worker", about = "Distributed Game of Life stripe-compute worker")]
struct Args {
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gol_core::init_logging("worker");
    gol_core::install_interrupt_handler("worker");

    let args = Args::parse();
    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    log::info!("[worker] listening on :{}", args.port);

    // Tracks ComputeStripe calls dispatched but not yet finished, so
    // `Terminate` can drain in-flight work before exiting (spec.md §4.1).
    let inflight = Arc::new(AtomicU32::new(0));

    loop {
        let (stream, peer) = listener.accept().await?;
        log::info!("[worker] broker connected from {peer}");
        let inflight = inflight.clone();
        tokio::spawn(async move {
            serve_connection(stream, move |req: WorkerRequest| {
                let inflight = inflight.clone();
                async move { handle(req, inflight).await }
            })
            .await;
            log::info!("[worker] connection from {peer} closed");
        });
    }
}

async fn handle(request: WorkerRequest, inflight: Arc<AtomicU32>) -> WorkerResponse {
    match request {
        WorkerRequest::ComputeStripe { params, world, stripe_index, worker_count } => {
            inflight.fetch_add(1, Ordering::SeqCst);
            let rows = gol_core::compute_stripe(&params, &world, stripe_index, worker_count);
            inflight.fetch_sub(1, Ordering::SeqCst);
            WorkerResponse::Stripe { rows }
        }
        WorkerRequest::Terminate => {
            log::info!("[worker] terminate requested, draining in-flight calls");
            tokio::spawn(async move {
                while inflight.load(Ordering::SeqCst) > 0 {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                log::info!("[worker] drained, exiting");
                std::process::exit(0);
            });
            WorkerResponse::Terminated
        }
    }
}
