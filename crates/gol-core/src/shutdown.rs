//! Ctrl+C handling for the three binaries, modelled on the teacher's
//! `rbp_core::kys()` "immediate exit" handler. Unlike the teacher, this
//! system's graceful shutdown path is driven by the `Terminate` RPC, not by
//! the operator's terminal — Ctrl+C here is strictly the "something is
//! stuck, kill it" escape hatch.

/// Spawns a task that exits the process immediately on Ctrl+C.
#[cfg(feature = "server")]
pub fn install_interrupt_handler(process_name: &'static str) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        log::warn!("[{process_name}] interrupt received, exiting");
        std::process::exit(0);
    });
}
