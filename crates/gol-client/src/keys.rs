//! The keypress state machine (spec.md §4.3 table). Key reads happen on a
//! blocking thread (terminal input is synchronous) and are forwarded over a
//! channel to this async handler, so a key source that blocks for seconds
//! never stalls the ticker or an in-flight RPC.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use gol_core::Params;
use gol_io::{EventSink, ImageIo, KeyInput};
use gol_wire::{Event, SessionState};

use crate::broker_client::BrokerClient;
use crate::snapshot::SnapshotWriter;

pub struct KeypressHandler {
    broker: BrokerClient,
    params: Params,
    snapshots: Arc<SnapshotWriter>,
    sink: Arc<Mutex<dyn EventSink>>,
    // Serialises the fetch-then-enqueue sequence for `s`, per spec.md §4.3
    // ("a local mutex serialises snapshot operations so they do not
    // interleave with themselves").
    snapshot_lock: Mutex<()>,
}

impl KeypressHandler {
    pub fn new(
        broker: BrokerClient,
        params: Params,
        image_io: Arc<dyn ImageIo + Send + Sync>,
        sink: Arc<Mutex<dyn EventSink>>,
    ) -> Self {
        Self {
            broker,
            params,
            snapshots: Arc::new(SnapshotWriter::new(image_io, sink.clone())),
            sink,
            snapshot_lock: Mutex::new(()),
        }
    }

    pub fn snapshots(&self) -> Arc<SnapshotWriter> {
        self.snapshots.clone()
    }

    /// Runs until `q`/`k` is pressed or the key source closes. Each key
    /// blocks until the prior key's RPC(s) have been issued, matching the
    /// spec's "single handler reading one key at a time".
    pub async fn run(self: Arc<Self>, mut keys: Box<dyn KeyInput>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<char>();
        tokio::task::spawn_blocking(move || loop {
            match keys.next_key() {
                Ok(Some(c)) => {
                    if tx.send(c).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("[client] key input error: {e}");
                    break;
                }
            }
        });

        while let Some(key) = rx.recv().await {
            match key {
                's' => self.handle_snapshot().await,
                'q' => {
                    self.handle_quit().await;
                    break;
                }
                'k' => {
                    self.handle_kill().await;
                    break;
                }
                'p' => self.handle_pause_toggle().await,
                _ => {}
            }
        }
    }

    async fn handle_snapshot(&self) {
        let _guard = self.snapshot_lock.lock().await;
        match self.broker.current_world_state().await {
            Ok((world, turn, _paused)) => {
                let filename = format!(
                    "{}x{}x{}",
                    self.params.image_width, self.params.image_height, turn
                );
                self.snapshots.write_async(filename, turn, world).await;
            }
            Err(e) => log::error!("[client] snapshot fetch failed: {e}"),
        }
    }

    async fn handle_quit(&self) {
        if let Err(e) = self.broker.quit().await {
            log::error!("[client] quit request failed: {e}");
        }
    }

    async fn handle_kill(&self) {
        // Pin a snapshot before terminating; the controller's final path
        // will fetch and write the authoritative board regardless.
        if let Err(e) = self.broker.current_world_state().await {
            log::error!("[client] pre-terminate snapshot fetch failed: {e}");
        }
        if let Err(e) = self.broker.terminate().await {
            log::error!("[client] terminate request failed: {e}");
        }
    }

    async fn handle_pause_toggle(&self) {
        let paused = match self.broker.current_world_state().await {
            Ok((_, _, paused)) => paused,
            Err(e) => {
                log::error!("[client] pause-state fetch failed: {e}");
                return;
            }
        };
        if !paused {
            if let Err(e) = self.broker.pause().await {
                log::error!("[client] pause request failed: {e}");
                return;
            }
            let (_, turn, _) = self.broker.current_world_state().await.unwrap_or((
                gol_core::World::empty(self.params.image_width, self.params.image_height),
                0,
                true,
            ));
            println!("Pausing on turn {turn}");
            self.sink
                .lock()
                .await
                .emit(Event::StateChange { turn, state: SessionState::Paused });
        } else {
            let (_, turn, _) = self.broker.current_world_state().await.unwrap_or((
                gol_core::World::empty(self.params.image_width, self.params.image_height),
                0,
                false,
            ));
            println!("Continuing");
            self.sink
                .lock()
                .await
                .emit(Event::StateChange { turn, state: SessionState::Executing });
            if let Err(e) = self.broker.pause().await {
                log::error!("[client] resume request failed: {e}");
            }
        }
    }
}
