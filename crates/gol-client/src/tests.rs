//! Controller-level integration test: a real in-process broker and worker,
//! fake `ImageIo`/`EventSink`/`KeyInput` collaborators (spec.md §6's
//! external interfaces), driving one full session end to end.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;

use gol_core::{Params, World};
use gol_io::{EventSink, ImageIo, KeyInput};
use gol_wire::{serve_connection, Event, WorkerRequest, WorkerResponse};

use crate::controller::Controller;

struct MemoryImageIo {
    initial: World,
    written: Mutex<HashMap<String, World>>,
}

impl ImageIo for MemoryImageIo {
    fn read_pgm(&self, width: u32, height: u32) -> anyhow::Result<World> {
        anyhow::ensure!(self.initial.width() == width && self.initial.height() == height);
        Ok(self.initial.clone())
    }

    fn write_pgm(&self, filename: &str, world: &World) -> anyhow::Result<()> {
        self.written
            .try_lock()
            .expect("test never contends this lock")
            .insert(filename.to_string(), world.clone());
        Ok(())
    }
}

struct RecordingSink {
    events: Arc<std::sync::Mutex<Vec<Event>>>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Closes immediately, as if the terminal input source hung up — the
/// controller's keypress task should simply end without affecting Evolve.
struct NoKeys;

impl KeyInput for NoKeys {
    fn next_key(&mut self) -> anyhow::Result<Option<char>> {
        Ok(None)
    }
}

async fn spawn_worker() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => break,
            };
            tokio::spawn(async move {
                serve_connection(stream, |req: WorkerRequest| async move {
                    match req {
                        WorkerRequest::ComputeStripe { params, world, stripe_index, worker_count } => {
                            let rows = gol_core::compute_stripe(&params, &world, stripe_index, worker_count);
                            WorkerResponse::Stripe { rows }
                        }
                        WorkerRequest::Terminate => WorkerResponse::Terminated,
                    }
                })
                .await;
            });
        }
    });
    addr
}

async fn spawn_broker(worker_addrs: &[String]) -> (String, Arc<gol_broker::Session>) {
    let pool = gol_broker::WorkerPool::dial(worker_addrs).await.unwrap();
    let session = Arc::new(gol_broker::Session::new(pool));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let run_session = session.clone();
    let port = addr.port();
    tokio::spawn(async move {
        let _ = gol_broker::run(port, run_session).await;
    });
    // give the accept loop a moment to bind
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    (format!("127.0.0.1:{port}"), session)
}

fn blinker(width: u32, height: u32) -> World {
    let mut rows = vec![vec![0u8; width as usize]; height as usize];
    for x in 6..=8 {
        rows[7][x as usize] = 255;
    }
    World::from_rows(rows).unwrap()
}

#[tokio::test]
async fn full_session_runs_to_completion_and_emits_terminal_events() {
    let worker_addr = spawn_worker().await;
    let (broker_addr, _session) = spawn_broker(&[worker_addr]).await;

    let params = Params::new(2, 1, 16, 16);
    let image_io = Arc::new(MemoryImageIo {
        initial: blinker(16, 16),
        written: Mutex::new(HashMap::new()),
    });
    let recorded_events = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink: Arc<Mutex<dyn EventSink>> =
        Arc::new(Mutex::new(RecordingSink { events: recorded_events.clone() }));

    let controller = Controller::connect(&broker_addr, params, image_io.clone(), sink)
        .await
        .unwrap();
    let turn = controller.run(Box::new(NoKeys)).await.unwrap();

    assert_eq!(turn, 2);
    let written = image_io.written.lock().await;
    assert!(written.contains_key("16x16x2"));

    let events = recorded_events.lock().unwrap().clone();
    assert!(matches!(events.first(), Some(Event::StateChange { turn: 0, .. })));
    assert!(matches!(events.last(), Some(Event::StateChange { .. })));
    assert!(events.iter().any(|e| matches!(e, Event::FinalTurnComplete { .. })));
}
