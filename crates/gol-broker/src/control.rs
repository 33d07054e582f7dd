//! Latched-flag + rendezvous control signals (spec.md §9's re-architecture
//! of "panics for control flow"). A [`Latch`] pairs a boolean the sender
//! sets synchronously with a `Notify` the receiver can wait on; because the
//! flag is latched *before* the notify fires, a receiver that is busy
//! finishing the current turn (and so isn't waiting yet) still observes the
//! request at its next check — the signal can never be silently dropped the
//! way a bare channel send can be if nobody is listening.

use tokio::sync::{Mutex, Notify};

/// A one-shot "please do X" request, observable both by polling and by
/// waiting. Cleared on the next `Initialise`, never by the waiter.
pub struct Latch {
    requested: Mutex<bool>,
    notify: Notify,
}

impl Latch {
    pub fn new() -> Self {
        Self {
            requested: Mutex::new(false),
            notify: Notify::new(),
        }
    }

    /// Sets the flag and wakes anyone parked in [`Latch::notified`]. Safe to
    /// call whether or not a receiver is currently waiting.
    pub async fn set(&self) {
        *self.requested.lock().await = true;
        self.notify.notify_one();
    }

    pub async fn is_set(&self) -> bool {
        *self.requested.lock().await
    }

    pub async fn clear(&self) {
        *self.requested.lock().await = false;
    }

    /// Waits for a future `set()`. Callers that need to also observe a flag
    /// latched *before* they started waiting should check `is_set()` first.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}

/// The `paused` control state and its resume rendezvous (spec.md §5's
/// "pause lock"), kept separate from the evolve lock so a `Pause` RPC
/// arriving mid-turn only has to wait for the *current* turn's fan-in, not
/// for the whole remaining run.
pub struct PauseGate {
    paused: Mutex<bool>,
    resume: Notify,
}

impl PauseGate {
    pub fn new() -> Self {
        Self {
            paused: Mutex::new(false),
            resume: Notify::new(),
        }
    }

    pub async fn is_paused(&self) -> bool {
        *self.paused.lock().await
    }

    /// Toggles `paused`. Invariant (I5): this only runs at a turn boundary
    /// or in response to a `Pause` RPC, never mid-turn. When toggling
    /// running, wakes the `Evolve` loop parked on [`PauseGate::wait_resume`].
    pub async fn toggle(&self) -> bool {
        let mut guard = self.paused.lock().await;
        *guard = !*guard;
        let now_paused = *guard;
        drop(guard);
        if !now_paused {
            self.resume.notify_one();
        }
        now_paused
    }

    pub async fn reset_running(&self) {
        *self.paused.lock().await = false;
    }

    pub async fn wait_resume(&self) {
        self.resume.notified().await;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// The three request-triggered signals `Evolve` selects over while paused,
/// plus the broker-wide `shutdown` rendezvous triggered once `Terminate`'s
/// client has disconnected (spec.md §5).
pub struct Signals {
    pub quit: Latch,
    pub terminate: Latch,
    pub shutdown: Latch,
}

impl Signals {
    pub fn new() -> Self {
        Self {
            quit: Latch::new(),
            terminate: Latch::new(),
            shutdown: Latch::new(),
        }
    }

    pub async fn reset(&self) {
        self.quit.clear().await;
        self.terminate.clear().await;
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}
