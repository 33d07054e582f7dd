//! Abstract collaborator interfaces the core depends on: image I/O,
//! keyboard input, and the UI event stream. Each ships a default
//! implementation so the binaries run end to end, but nothing in
//! `gol-broker`/`gol-client` depends on these concrete types.

mod keys;
mod pgm;
mod sink;

pub use keys::{CrosstermKeyInput, KeyInput};
pub use pgm::{FilePgmIo, ImageIo};
pub use sink::{EventSink, LoggingEventSink};
