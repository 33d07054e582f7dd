//! The broker's accept loop: admits at most one client (spec.md §4.2,
//! invariant I4), dispatches its RPCs to the shared [`Session`], and drives
//! the broker-wide shutdown path once a `Terminate`'d client disconnects.

use std::sync::Arc;

use tokio::net::TcpListener;

use gol_wire::{serve_connection, BrokerRequest, BrokerResponse};

use crate::error::BrokerError;
use crate::session::Session;

impl From<BrokerError> for BrokerResponse {
    fn from(e: BrokerError) -> Self {
        BrokerResponse::Error { message: e.to_string() }
    }
}

async fn dispatch(session: &Arc<Session>, request: BrokerRequest) -> BrokerResponse {
    match request {
        BrokerRequest::Initialise { params, world } => match session.initialise(params, world).await {
            Ok(()) => BrokerResponse::Ok,
            Err(e) => e.into(),
        },
        BrokerRequest::Evolve { params } => match session.evolve(params).await {
            Ok(outcome) => BrokerResponse::Evolved {
                final_board: outcome.final_board,
                turn: outcome.turn,
                quit: outcome.quit,
                terminated: outcome.terminated,
            },
            Err(e) => e.into(),
        },
        // Legacy `world` payload, if present, is decoded and ignored per the
        // canonical empty-request contract (spec.md §9's open question).
        BrokerRequest::CurrentWorldState { world: _ } => {
            match session.current_world_state().await {
                Ok((final_board, turn, paused)) => {
                    BrokerResponse::WorldState { final_board, turn, paused }
                }
                Err(e) => e.into(),
            }
        }
        BrokerRequest::ReportAliveCells => match session.report_alive_cells().await {
            Ok((cells, turn)) => BrokerResponse::AliveCells { cells, turn },
            Err(e) => e.into(),
        },
        BrokerRequest::Pause => {
            session.pause().await;
            BrokerResponse::Ok
        }
        BrokerRequest::Quit => {
            session.quit().await;
            BrokerResponse::Ok
        }
        BrokerRequest::Terminate => {
            session.terminate().await;
            BrokerResponse::Ok
        }
    }
}

/// Serves one admitted client's connection to completion, then releases the
/// admission gate and — if that client had latched `Terminate` — signals
/// the broker-wide shutdown rendezvous (spec.md §5's "session wait-group").
async fn handle_client(session: Arc<Session>, stream: tokio::net::TcpStream, peer: std::net::SocketAddr) {
    serve_connection(stream, {
        let session = session.clone();
        move |req| {
            let session = session.clone();
            async move { dispatch(&session, req).await }
        }
    })
    .await;
    log::info!("[broker] client {peer} disconnected");
    session.release().await;
    if session.terminate_requested().await {
        session.signal_shutdown().await;
    }
}

/// Accepts connections on `client_port` forever, admitting at most one
/// client at a time (second-client policy: rejected outright, spec.md §9).
/// Returns once the shutdown rendezvous fires, i.e. after a `Terminate`'d
/// client disconnects, and fans `Terminate` out to every worker before
/// returning.
pub async fn run(client_port: u16, session: Arc<Session>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", client_port)).await?;
    log::info!("[broker] listening for clients on :{client_port}");

    let accept_session = session.clone();
    let accept_loop = tokio::spawn(async move {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    log::error!("[broker] accept failed: {e}");
                    continue;
                }
            };
            if !accept_session.try_admit().await {
                log::warn!("[broker] rejecting {peer}: a client is already admitted");
                drop(stream);
                continue;
            }
            log::info!("[broker] client connected from {peer}");
            tokio::spawn(handle_client(accept_session.clone(), stream, peer));
        }
    });

    session.wait_shutdown().await;
    accept_loop.abort();
    log::info!("[broker] shutdown signalled, fanning out terminate to workers");
    session.pool().terminate_all().await;
    Ok(())
}
