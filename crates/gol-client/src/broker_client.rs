//! Typed wrapper around the raw [`RpcClient`] for the broker's RPC surface
//! (spec.md §4.2 table), so the keypress FSM, ticker, and controller never
//! hand-roll request/response matching.

use std::sync::Arc;

use anyhow::{anyhow, bail};
use gol_core::{Cell, Params, World};
use gol_wire::{BrokerRequest, BrokerResponse, RpcClient};

#[derive(Clone)]
pub struct BrokerClient {
    inner: Arc<RpcClient<BrokerResponse>>,
}

impl BrokerClient {
    pub async fn connect(addr: &str) -> anyhow::Result<Self> {
        let inner = RpcClient::connect(addr)
            .await
            .map_err(|e| anyhow!("failed to dial broker at {addr}: {e}"))?;
        Ok(Self { inner: Arc::new(inner) })
    }

    pub fn raw(&self) -> Arc<RpcClient<BrokerResponse>> {
        self.inner.clone()
    }

    pub async fn initialise(&self, params: Params, world: World) -> anyhow::Result<()> {
        match self.call(BrokerRequest::Initialise { params, world }).await? {
            BrokerResponse::Ok => Ok(()),
            other => unexpected("initialise", other),
        }
    }

    pub async fn evolve(&self, params: Params) -> anyhow::Result<(World, u32, bool, bool)> {
        match self.call(BrokerRequest::Evolve { params }).await? {
            BrokerResponse::Evolved { final_board, turn, quit, terminated } => {
                Ok((final_board, turn, quit, terminated))
            }
            other => unexpected("evolve", other),
        }
    }

    pub async fn current_world_state(&self) -> anyhow::Result<(World, u32, bool)> {
        match self.call(BrokerRequest::CurrentWorldState { world: None }).await? {
            BrokerResponse::WorldState { final_board, turn, paused } => Ok((final_board, turn, paused)),
            other => unexpected("current_world_state", other),
        }
    }

    pub async fn report_alive_cells(&self) -> anyhow::Result<(Vec<Cell>, u32)> {
        match self.call(BrokerRequest::ReportAliveCells).await? {
            BrokerResponse::AliveCells { cells, turn } => Ok((cells, turn)),
            other => unexpected("report_alive_cells", other),
        }
    }

    pub async fn pause(&self) -> anyhow::Result<()> {
        match self.call(BrokerRequest::Pause).await? {
            BrokerResponse::Ok => Ok(()),
            other => unexpected("pause", other),
        }
    }

    pub async fn quit(&self) -> anyhow::Result<()> {
        match self.call(BrokerRequest::Quit).await? {
            BrokerResponse::Ok => Ok(()),
            other => unexpected("quit", other),
        }
    }

    pub async fn terminate(&self) -> anyhow::Result<()> {
        match self.call(BrokerRequest::Terminate).await? {
            BrokerResponse::Ok => Ok(()),
            other => unexpected("terminate", other),
        }
    }

    async fn call(&self, request: BrokerRequest) -> anyhow::Result<BrokerResponse> {
        let response = self
            .inner
            .call::<BrokerRequest>(request)
            .await
            .map_err(|e| anyhow!("broker transport error: {e}"))?;
        if let BrokerResponse::Error { message } = &response {
            bail!("broker rejected request: {message}");
        }
        Ok(response)
    }
}

fn unexpected<T>(op: &str, response: BrokerResponse) -> anyhow::Result<T> {
    Err(anyhow!("unexpected broker response to {op}: {response:?}"))
}
