use gol_core::Cell;
use serde::{Deserialize, Serialize};

/// Session state reported alongside `StateChange` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Executing,
    Paused,
    Quitting,
}

/// Events the client controller emits to its UI collaborator (spec.md §6).
/// Tagged the same way the teacher tags `ServerMessage` for its WebSocket
/// wire format, so the default [`crate::EventSink`] can simply serialise and
/// log/forward each variant without a bespoke encoder per event kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StateChange { turn: u32, state: SessionState },
    AliveCellsCount { turn: u32, count: usize },
    ImageOutputComplete { turn: u32, filename: String },
    FinalTurnComplete { turn: u32, cells: Vec<Cell> },
}

impl Event {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize event")
    }
}
