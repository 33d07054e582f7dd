//! The broker's authoritative state machine (spec.md §3's `BrokerState`,
//! §4.2's `Evolve` algorithm). One [`Session`] exists for the lifetime of
//! the broker process; re-architected per spec.md §9 as a value the accept
//! loop owns and closes handlers over, rather than process-global statics.

use tokio::sync::Mutex;

use gol_core::{Cell, Params, World};

use crate::control::{PauseGate, Signals};
use crate::error::BrokerError;
use crate::worker_pool::WorkerPool;

struct Board {
    world: World,
    turn: u32,
}

/// Result of a completed or interrupted `Evolve` call (spec.md §4.2 table).
pub struct EvolveOutcome {
    pub final_board: World,
    pub turn: u32,
    pub quit: bool,
    pub terminated: bool,
}

/// Authoritative world/turn/control state, guarded by the "evolve lock" and
/// "pause lock" from spec.md §5. `board` is `None` until the first
/// `Initialise`, which is how `Evolve`-before-`Initialise` (protocol misuse,
/// spec.md §7 category 2) is detected.
pub struct Session {
    board: Mutex<Option<Board>>,
    params: Mutex<Option<Params>>,
    pause: PauseGate,
    signals: Signals,
    evolving: Mutex<bool>,
    admitted: Mutex<bool>,
    pool: WorkerPool,
}

impl Session {
    pub fn new(pool: WorkerPool) -> Self {
        Self {
            board: Mutex::new(None),
            params: Mutex::new(None),
            pause: PauseGate::new(),
            signals: Signals::new(),
            evolving: Mutex::new(false),
            admitted: Mutex::new(false),
            pool,
        }
    }

    // ---- admission (invariant I4, property P6) ----------------------------

    /// Tries to admit a new client. Second-client policy (spec.md §9 open
    /// question, resolved in DESIGN.md): rejected outright, not queued.
    pub async fn try_admit(&self) -> bool {
        let mut guard = self.admitted.lock().await;
        if *guard {
            false
        } else {
            *guard = true;
            true
        }
    }

    pub async fn release(&self) {
        *self.admitted.lock().await = false;
    }

    // ---- Initialise ---------------------------------------------------------

    /// Overwrites `currentWorld`, resets `currentTurn=0`, clears latched
    /// flags (spec.md §4.2 table). Must precede `Evolve`. Rejects a world
    /// whose dimensions don't match `params` (invariant I1).
    pub async fn initialise(&self, params: Params, world: World) -> Result<(), BrokerError> {
        if !world.matches(&params) {
            return Err(BrokerError::DimensionMismatch(format!(
                "world {}x{} does not match params {}x{}",
                world.width(),
                world.height(),
                params.image_width,
                params.image_height
            )));
        }
        *self.board.lock().await = Some(Board { world, turn: 0 });
        *self.params.lock().await = Some(params);
        self.pause.reset_running().await;
        self.signals.reset().await;
        Ok(())
    }

    // ---- Evolve ---------------------------------------------------------------

    /// Advances the simulation to `params.turns` or until quit/terminate,
    /// per the algorithm in spec.md §4.2. Exactly one call may be in flight
    /// per session (spec.md §4.2 table: "exactly one may be in flight").
    pub async fn evolve(&self, params: Params) -> Result<EvolveOutcome, BrokerError> {
        {
            let mut inflight = self.evolving.lock().await;
            if *inflight {
                return Err(BrokerError::EvolveAlreadyInFlight);
            }
            *inflight = true;
        }
        let outcome = self.evolve_inner(params).await;
        *self.evolving.lock().await = false;
        outcome
    }

    async fn evolve_inner(&self, params: Params) -> Result<EvolveOutcome, BrokerError> {
        {
            let guard = self.board.lock().await;
            if guard.is_none() {
                return Err(BrokerError::NotInitialised);
            }
        }

        loop {
            let (world, turn) = {
                let guard = self.board.lock().await;
                let board = guard.as_ref().expect("checked not-None above");
                (board.world.clone(), board.turn)
            };

            // Tie-break: params.turns == 0 returns immediately unchanged (P1).
            if turn >= params.turns {
                return Ok(EvolveOutcome {
                    final_board: world,
                    turn,
                    quit: false,
                    terminated: false,
                });
            }

            // Step 1-5: acquire the evolve lock, fan out, fan in, assemble,
            // commit, release. Held only for this turn's fan-out/fan-in so
            // readers between turns never block on the whole remaining run.
            let next_world = {
                let mut guard = self.board.lock().await;
                let board = guard.as_mut().expect("checked not-None above");
                let next = self.pool.step(&params, &board.world).await?;
                board.world = next.clone();
                board.turn += 1;
                next
            };
            let next_turn = turn + 1;

            // Step 6: control-plane priority check at the turn boundary.
            if self.signals.terminate.is_set().await {
                return Ok(EvolveOutcome {
                    final_board: next_world,
                    turn: next_turn,
                    quit: false,
                    terminated: true,
                });
            }
            if self.signals.quit.is_set().await {
                return Ok(EvolveOutcome {
                    final_board: next_world,
                    turn: next_turn,
                    quit: true,
                    terminated: false,
                });
            }
            if self.pause.is_paused().await {
                if let Some(outcome) = self.wait_out_pause(next_world.clone(), next_turn).await {
                    return Ok(outcome);
                }
            }
        }
    }

    /// Blocks on `{resume, quit, terminate}` while paused, re-checking the
    /// latched flags on every wakeup (spec.md §5's rendezvous discipline —
    /// a notify without the flag set is not actionable, since `resume` and
    /// `quit`/`terminate` share the same notify-driven wakeup path here).
    /// Returns `Some(outcome)` if quit/terminate fired, `None` once resumed.
    async fn wait_out_pause(&self, world: World, turn: u32) -> Option<EvolveOutcome> {
        loop {
            tokio::select! {
                _ = self.pause.wait_resume() => {
                    if !self.pause.is_paused().await {
                        return None;
                    }
                }
                _ = self.signals.quit.notified() => {
                    if self.signals.quit.is_set().await {
                        return Some(EvolveOutcome { final_board: world, turn, quit: true, terminated: false });
                    }
                }
                _ = self.signals.terminate.notified() => {
                    if self.signals.terminate.is_set().await {
                        return Some(EvolveOutcome { final_board: world, turn, quit: false, terminated: true });
                    }
                }
            }
        }
    }

    // ---- readers (atomic snapshots, P3/P4) -----------------------------------

    /// `{finalBoard, turn, paused}` from one atomic snapshot (spec.md §4.2).
    pub async fn current_world_state(&self) -> Result<(World, u32, bool), BrokerError> {
        let guard = self.board.lock().await;
        let board = guard.as_ref().ok_or(BrokerError::NotInitialised)?;
        let paused = self.pause.is_paused().await;
        Ok((board.world.clone(), board.turn, paused))
    }

    /// `{aliveCells[], turn}` from one atomic snapshot (property P4).
    pub async fn report_alive_cells(&self) -> Result<(Vec<Cell>, u32), BrokerError> {
        let guard = self.board.lock().await;
        let board = guard.as_ref().ok_or(BrokerError::NotInitialised)?;
        Ok((board.world.alive_cells(), board.turn))
    }

    // ---- control plane --------------------------------------------------------

    /// Toggles `paused`; unblocks a parked `Evolve` when toggling to running.
    pub async fn pause(&self) -> bool {
        self.pause.toggle().await
    }

    /// Latches `quitRequested` and wakes any parked `Evolve`.
    pub async fn quit(&self) {
        self.signals.quit.set().await;
    }

    /// Latches `terminateRequested` and wakes any parked `Evolve`.
    pub async fn terminate(&self) {
        self.signals.terminate.set().await;
    }

    pub async fn terminate_requested(&self) -> bool {
        self.signals.terminate.is_set().await
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Broker-wide shutdown rendezvous, signalled once the terminating
    /// client's connection has closed (spec.md §5's "session wait-group").
    pub async fn signal_shutdown(&self) {
        self.signals.shutdown.set().await;
    }

    pub async fn wait_shutdown(&self) {
        if !self.signals.shutdown.is_set().await {
            self.signals.shutdown.notified().await;
        }
    }
}
