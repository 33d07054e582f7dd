//! Session-level property and scenario tests (spec.md §8: P1, P3, P6, P7,
//! scenarios 6 and 7). Spins up real in-process TCP workers rather than
//! mocking [`WorkerPool`] — the same `ComputeStripe` handler `bin/worker`
//! runs, just bound to an ephemeral port for the test.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use gol_core::{Params, World};
use gol_wire::{serve_connection, WorkerRequest, WorkerResponse};

use crate::session::Session;
use crate::worker_pool::WorkerPool;

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

async fn test_session(worker_count: usize) -> Arc<Session> {
    let mut addresses = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        addresses.push(spawn_worker().await);
    }
    let pool = WorkerPool::dial(&addresses).await.unwrap();
    Arc::new(Session::new(pool))
}

fn blinker(width: u32, height: u32) -> World {
    let mut rows = vec![vec![0u8; width as usize]; height as usize];
    for x in 6..=8 {
        rows[7][x as usize] = 255;
    }
    World::from_rows(rows).unwrap()
}

#[tokio::test]
async fn p1_zero_turns_returns_unchanged_board() {
    let session = test_session(3).await;
    let params = Params::new(0, 1, 16, 16);
    let world = blinker(16, 16);
    session.initialise(params, world.clone()).await.unwrap();

    let outcome = session.evolve(params).await.unwrap();
    assert_eq!(outcome.turn, 0);
    assert_eq!(outcome.final_board, world);
    assert!(!outcome.quit && !outcome.terminated);
}

#[tokio::test]
async fn initialise_rejects_world_dimension_mismatch() {
    let session = test_session(1).await;
    let params = Params::new(10, 1, 16, 16);
    let wrong_sized_world = World::empty(8, 8);
    let err = session.initialise(params, wrong_sized_world).await.unwrap_err();
    assert!(matches!(err, crate::error::BrokerError::DimensionMismatch(_)));
}

#[tokio::test]
async fn evolve_before_initialise_is_protocol_misuse() {
    let session = test_session(2).await;
    let params = Params::new(10, 1, 16, 16);
    let err = session.evolve(params).await.unwrap_err();
    assert_eq!(err, crate::error::BrokerError::NotInitialised);
}

#[tokio::test]
async fn p6_second_admission_attempt_is_rejected() {
    let session = test_session(1).await;
    assert!(session.try_admit().await);
    assert!(!session.try_admit().await);
    session.release().await;
    assert!(session.try_admit().await);
}

#[tokio::test]
async fn p3_turn_is_monotonic_across_reads_during_evolve() {
    let session = test_session(4).await;
    let params = Params::new(50, 1, 16, 16);
    session.initialise(params, blinker(16, 16)).await.unwrap();

    let run_session = session.clone();
    let handle = tokio::spawn(async move { run_session.evolve(params).await.unwrap() });

    let mut last_turn = 0u32;
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if let Ok((_, turn, _)) = session.current_world_state().await {
            assert!(turn >= last_turn);
            last_turn = turn;
        }
    }
    let outcome = handle.await.unwrap();
    assert_eq!(outcome.turn, 50);
}

#[tokio::test]
async fn scenario_7_quit_stops_evolve_short_of_turns() {
    let session = test_session(2).await;
    let params = Params::new(1_000_000, 1, 16, 16);
    session.initialise(params, blinker(16, 16)).await.unwrap();

    let run_session = session.clone();
    let handle = tokio::spawn(async move { run_session.evolve(params).await.unwrap() });

    tokio::time::sleep(Duration::from_millis(20)).await;
    session.quit().await;

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("evolve should return promptly after quit")
        .unwrap();
    assert!(outcome.quit);
    assert!(!outcome.terminated);
    assert!(outcome.turn < params.turns);

    // A fresh Initialise/Evolve cycle proceeds normally afterwards.
    session.initialise(params, blinker(16, 16)).await.unwrap();
    assert!(!session.terminate_requested().await);
}

#[tokio::test]
async fn scenario_6_pause_then_resume_unblocks_evolve() {
    let session = test_session(2).await;
    let params = Params::new(1_000_000, 1, 16, 16);
    session.initialise(params, blinker(16, 16)).await.unwrap();

    let run_session = session.clone();
    let handle = tokio::spawn(async move { run_session.evolve(params).await.unwrap() });

    tokio::time::sleep(Duration::from_millis(10)).await;
    session.pause().await; // running -> paused
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (_, turn_a, paused_a) = session.current_world_state().await.unwrap();
    assert!(paused_a);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let (_, turn_b, _) = session.current_world_state().await.unwrap();
    assert_eq!(turn_a, turn_b, "turn must not advance while paused");

    session.pause().await; // paused -> running
    tokio::time::sleep(Duration::from_millis(20)).await;
    let (_, turn_c, paused_c) = session.current_world_state().await.unwrap();
    assert!(!paused_c);
    assert!(turn_c > turn_b, "turn must advance again after resume");

    session.terminate().await;
    let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
}

#[tokio::test]
async fn p8_reinitialise_with_same_board_reproduces_final_board() {
    let session = test_session(3).await;
    let params = Params::new(5, 1, 16, 16);
    let board = blinker(16, 16);

    session.initialise(params, board.clone()).await.unwrap();
    let first = session.evolve(params).await.unwrap();

    session.initialise(params, board).await.unwrap();
    let second = session.evolve(params).await.unwrap();

    assert_eq!(first.final_board, second.final_board);
    assert_eq!(first.turn, second.turn);
}
