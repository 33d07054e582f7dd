//! The client controller (spec.md §4.3): loads the initial board, dials the
//! broker, drives the long-running `Evolve` call concurrently with the
//! keypress loop and the alive-cells ticker, and runs the final shutdown
//! path.

use std::sync::Arc;

use tokio::sync::Mutex;

use gol_core::Params;
use gol_io::{EventSink, ImageIo, KeyInput};
use gol_wire::{Event, SessionState};

use crate::broker_client::BrokerClient;
use crate::keys::KeypressHandler;
use crate::ticker;

pub struct Controller {
    broker: BrokerClient,
    params: Params,
    image_io: Arc<dyn ImageIo + Send + Sync>,
    sink: Arc<Mutex<dyn EventSink>>,
}

impl Controller {
    pub async fn connect(
        broker_addr: &str,
        params: Params,
        image_io: Arc<dyn ImageIo + Send + Sync>,
        sink: Arc<Mutex<dyn EventSink>>,
    ) -> anyhow::Result<Self> {
        let broker = BrokerClient::connect(broker_addr).await?;
        Ok(Self { broker, params, image_io, sink })
    }

    /// Runs one full session: load board, initialise, evolve with the
    /// keypress loop and ticker running concurrently, then the final path.
    /// Returns the turn the session ended on.
    pub async fn run(self, keys: Box<dyn KeyInput>) -> anyhow::Result<u32> {
        let initial = self
            .image_io
            .read_pgm(self.params.image_width, self.params.image_height)?;
        self.broker.initialise(self.params, initial).await?;
        self.sink.lock().await.emit(Event::StateChange {
            turn: 0,
            state: SessionState::Executing,
        });

        let keypress_handler = Arc::new(KeypressHandler::new(
            self.broker.clone(),
            self.params,
            self.image_io.clone(),
            self.sink.clone(),
        ));
        let snapshots = keypress_handler.snapshots();
        let keys_task = tokio::spawn(keypress_handler.clone().run(keys));

        let ticker_handle = ticker::spawn(self.broker.raw(), self.sink.clone());

        let (final_board, turn, quit, terminated) = self.broker.evolve(self.params).await?;

        ticker_handle.stop().await;

        if quit || terminated {
            // Pin the board at the moment of stop: fetch once more rather
            // than trusting Evolve's own snapshot, since a `k` or `q` can
            // race the final turn boundary (spec.md §4.3 final path).
            let (board, turn, _) = match self.broker.current_world_state().await {
                Ok(triple) => triple,
                Err(_) => (final_board, turn, false),
            };
            let filename = format!(
                "{}x{}x{}",
                self.params.image_width, self.params.image_height, turn
            );
            self.image_io.write_pgm(&filename, &board)?;
            self.sink
                .lock()
                .await
                .emit(Event::ImageOutputComplete { turn, filename });
            self.sink.lock().await.emit(Event::StateChange {
                turn,
                state: SessionState::Quitting,
            });
        } else {
            let filename = format!(
                "{}x{}x{}",
                self.params.image_width, self.params.image_height, self.params.turns
            );
            self.image_io.write_pgm(&filename, &final_board)?;
            self.sink.lock().await.emit(Event::FinalTurnComplete {
                turn,
                cells: final_board.alive_cells(),
            });
            snapshots.wait_idle().await;
            self.sink.lock().await.emit(Event::StateChange {
                turn,
                state: SessionState::Quitting,
            });
        }

        keys_task.abort();
        Ok(turn)
    }
}
