//! Asynchronous PGM snapshot writes, so a slow disk never stalls the
//! keypress loop. The final shutdown path waits for this subsystem to go
//! idle before closing the event stream (spec.md §4.3's "wait for the I/O
//! subsystem to go idle").

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use gol_core::World;
use gol_io::{EventSink, ImageIo};

pub struct SnapshotWriter {
    image_io: Arc<dyn ImageIo + Send + Sync>,
    sink: Arc<Mutex<dyn EventSink>>,
    inflight: Mutex<Vec<JoinHandle<()>>>,
}

impl SnapshotWriter {
    pub fn new(image_io: Arc<dyn ImageIo + Send + Sync>, sink: Arc<Mutex<dyn EventSink>>) -> Self {
        Self { image_io, sink, inflight: Mutex::new(Vec::new()) }
    }

    /// Queues a write of `world` to `filename` and emits
    /// `ImageOutputComplete` once it lands. Spawned rather than awaited
    /// inline so the keypress loop can read the next key immediately.
    pub async fn write_async(&self, filename: String, turn: u32, world: World) {
        let image_io = self.image_io.clone();
        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            let filename_for_event = filename.clone();
            match image_io.write_pgm(&filename, &world) {
                Ok(()) => {
                    sink.lock().await.emit(gol_wire::Event::ImageOutputComplete {
                        turn,
                        filename: filename_for_event,
                    });
                }
                Err(e) => log::error!("[client] failed to write snapshot {filename}: {e}"),
            }
        });
        self.inflight.lock().await.push(handle);
    }

    /// Blocks until every queued write has completed.
    pub async fn wait_idle(&self) {
        let handles: Vec<_> = self.inflight.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}
