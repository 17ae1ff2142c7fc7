//! OS signal handling.
//!
//! SIGINT and SIGTERM start the drain through [`Shutdown`]. Signals that
//! arrive while already draining are logged and ignored.

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Installed termination signal handlers.
pub struct SignalListener {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl SignalListener {
    /// Register the handlers. Fails if the OS refuses the registration.
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next termination signal and return its name.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "ctrl-c"
    }
}

/// Forward every received signal to `shutdown` until the task is aborted.
pub fn forward_signals(mut signals: SignalListener, shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let signal = signals.recv().await;
            if shutdown.trigger() {
                tracing::info!(signal, "Shutdown signal received, draining");
            } else {
                tracing::info!(signal, "Shutdown already in progress, ignoring signal");
            }
        }
    })
}
