use gol_core::{Params, World};
use serde::{Deserialize, Serialize};

/// The worker's public contract (spec.md §4.1): compute one stripe of the
/// next generation, or shut down cleanly.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WorkerRequest {
    ComputeStripe {
        params: Params,
        world: World,
        stripe_index: u32,
        worker_count: u32,
    },
    Terminate,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WorkerResponse {
    Stripe { rows: Vec<Vec<u8>> },
    Terminated,
    Error { message: String },
}
