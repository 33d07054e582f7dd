//! Client controller process (spec.md §4.3). Loads the initial board,
//! dials the broker, and drives one full session: evolve, keypresses,
//! alive-cells ticker, final snapshot.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;

use gol_client::Controller;
use gol_core::Params;
use gol_io::{CrosstermKeyInput, FilePgmIo, LoggingEventSink};

/// CLI flags (spec.md §6). `--broker` is the core's own flag; the params
/// flags stand in for "provided by the surrounding harness" since this
/// binary has no harness wrapping it.
#[derive(Parser, Debug)]
#[command(name = "client", about = "Distributed Game of Life client controller")]
struct Args {
    #[arg(long, default_value = "localhost:8030")]
    broker: String,

    #[arg(long = "turns", default_value_t = 1_000_000_000)]
    turns: u32,

    #[arg(long = "threads", default_value_t = 1)]
    threads: u32,

    #[arg(long = "imageWidth", default_value_t = 16)]
    image_width: u32,

    #[arg(long = "imageHeight", default_value_t = 16)]
    image_height: u32,

    /// Directory PGM images are read from and written to.
    #[arg(long, default_value = "out")]
    dir: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gol_core::init_logging("client");
    gol_core::install_interrupt_handler("client");

    let args = Args::parse();
    let params = Params::new(args.turns, args.threads, args.image_width, args.image_height);

    let image_io: Arc<dyn gol_io::ImageIo + Send + Sync> = Arc::new(FilePgmIo::new(args.dir));
    let sink: Arc<Mutex<dyn gol_io::EventSink>> = Arc::new(Mutex::new(LoggingEventSink));
    let keys: Box<dyn gol_io::KeyInput> = Box::new(CrosstermKeyInput::new()?);

    let controller = Controller::connect(&args.broker, params, image_io, sink).await?;
    let turn = controller.run(keys).await?;
    log::info!("[client] session ended on turn {turn}");
    Ok(())
}
