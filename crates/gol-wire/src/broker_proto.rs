use gol_core::{Cell, Params, World};
use serde::{Deserialize, Serialize};

/// The broker's public RPC surface (spec.md §4.2 table), invoked by the
/// client over one persistent multiplexed connection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BrokerRequest {
    Initialise {
        params: Params,
        world: World,
    },
    Evolve {
        params: Params,
    },
    /// Empty per the canonical contract (spec.md §9); a `world` field is
    /// accepted and ignored for compatibility with legacy callers that still
    /// send one.
    CurrentWorldState {
        #[serde(default)]
        world: Option<World>,
    },
    ReportAliveCells,
    Pause,
    Quit,
    Terminate,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BrokerResponse {
    Ok,
    Evolved {
        final_board: World,
        turn: u32,
        quit: bool,
        terminated: bool,
    },
    WorldState {
        final_board: World,
        turn: u32,
        paused: bool,
    },
    AliveCells {
        cells: Vec<Cell>,
        turn: u32,
    },
    Error {
        message: String,
    },
}
