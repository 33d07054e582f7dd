//! The 2-second alive-cells ticker (spec.md §4.3). Runs as its own task so
//! it never blocks on the long-running `Evolve` call; stopped before the
//! final shutdown path via a dedicated cancellation signal rather than
//! shared "is ticker done" mutable state (spec.md §9's re-architecture
//! note).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use gol_io::EventSink;
use gol_wire::{BrokerRequest, BrokerResponse, Event, RpcClient};

const TICK_INTERVAL: Duration = Duration::from_secs(2);

/// Spawns the ticker and returns a handle whose [`TickerHandle::stop`] both
/// cancels the loop and waits for its final iteration to finish, so the
/// caller never races a tick against closing the event stream.
pub fn spawn(
    broker: Arc<RpcClient<BrokerResponse>>,
    sink: Arc<Mutex<dyn EventSink>>,
) -> TickerHandle {
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.tick().await; // first tick fires immediately; skip it
        loop {
            tokio::select! {
                _ = stop_rx.recv() => break,
                _ = interval.tick() => tick_once(&broker, &sink).await,
            }
        }
    });
    TickerHandle { stop_tx, task: Some(task) }
}

async fn tick_once(broker: &RpcClient<BrokerResponse>, sink: &Arc<Mutex<dyn EventSink>>) {
    // Ticker transport errors are swallowed; the next tick retries
    // (spec.md §7 category 5).
    match broker.call::<BrokerRequest>(BrokerRequest::ReportAliveCells).await {
        Ok(BrokerResponse::AliveCells { cells, turn }) => {
            sink.lock()
                .await
                .emit(Event::AliveCellsCount { turn, count: cells.len() });
        }
        Ok(_) | Err(_) => {}
    }
}

pub struct TickerHandle {
    stop_tx: mpsc::Sender<()>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TickerHandle {
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(()).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}
