//! # Termination signals for the event loop.
//!
//! [`wait_for_shutdown_signal`] completes once the process is asked to stop.
//! [`HeartbeatMonitor::run`](super::HeartbeatMonitor::run) races it against
//! its inputs, publishes `ShutdownRequested` and leaves the loop.
//!
//! | platform | signals                         |
//! |----------|---------------------------------|
//! | unix     | `SIGINT`, `SIGTERM`, `SIGQUIT`  |
//! | other    | Ctrl-C                          |

/// Waits for a termination signal.
///
/// Returns `Err` if the signal listeners cannot be installed; the caller
/// then keeps running without them.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
