//! The dialed worker pool and the per-turn fan-out/fan-in (spec.md §4.2
//! step 2-3). Stripe order is preserved by indexing the result `Vec` by
//! `stripe_index` directly rather than relying on completion order, per the
//! "do not rely on task completion order" re-architecture note in §9.

use futures::future::join_all;
use gol_core::{Params, World};
use gol_wire::{RpcClient, WorkerRequest, WorkerResponse};

use crate::error::BrokerError;

/// A pool of dialed, persistent connections to the fixed-size worker set.
/// Stateless between turns — each call is `(params, world, stripe_index)` in,
/// one stripe out, per the worker's compute contract (spec.md §4.1).
pub struct WorkerPool {
    workers: Vec<RpcClient<WorkerResponse>>,
}

impl WorkerPool {
    /// Dials every address in order; pool size is fixed for the process
    /// lifetime (no dynamic resizing, per spec.md's non-goals).
    pub async fn dial(addresses: &[String]) -> anyhow::Result<Self> {
        let mut workers = Vec::with_capacity(addresses.len());
        for addr in addresses {
            log::info!("[broker] dialing worker at {addr}");
            workers.push(RpcClient::connect(addr).await?);
        }
        Ok(Self { workers })
    }

    pub fn worker_count(&self) -> u32 {
        self.workers.len() as u32
    }

    /// Fans `ComputeStripe` out to every worker in parallel for `world`,
    /// waits for all N, and assembles the next-generation world in ascending
    /// stripe order (spec.md §4.2 steps 2-3). A worker RPC error aborts the
    /// whole turn (see DESIGN.md's resolution of the open question in §9).
    pub async fn step(&self, params: &Params, world: &World) -> Result<World, BrokerError> {
        let n = self.worker_count();
        let calls = self.workers.iter().enumerate().map(|(i, worker)| {
            let request = WorkerRequest::ComputeStripe {
                params: *params,
                world: world.clone(),
                stripe_index: i as u32,
                worker_count: n,
            };
            worker.call::<WorkerRequest>(request)
        });
        let results = join_all(calls).await;

        let mut stripes = Vec::with_capacity(results.len());
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(WorkerResponse::Stripe { rows }) => stripes.push(rows),
                Ok(WorkerResponse::Error { message }) => {
                    return Err(BrokerError::WorkerFailure(format!(
                        "stripe {i} returned an error: {message}"
                    )))
                }
                Ok(WorkerResponse::Terminated) => {
                    return Err(BrokerError::WorkerFailure(format!(
                        "stripe {i}'s worker reported terminated instead of computing"
                    )))
                }
                Err(e) => {
                    return Err(BrokerError::WorkerFailure(format!(
                        "stripe {i} transport error: {e}"
                    )))
                }
            }
        }
        Ok(gol_core::assemble(stripes))
    }

    /// Fans `Terminate` out to every worker, best-effort (spec.md §4.2's
    /// `Terminate` RPC, final step).
    pub async fn terminate_all(&self) {
        let calls = self
            .workers
            .iter()
            .map(|worker| worker.call::<WorkerRequest>(WorkerRequest::Terminate));
        for (i, result) in join_all(calls).await.into_iter().enumerate() {
            if let Err(e) = result {
                log::warn!("[broker] worker {i} did not acknowledge terminate: {e}");
            }
        }
    }
}
