//! Shutdown coordination for the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::channel::ChannelError;
use crate::net::listener::ListenerError;

/// Coordinator for graceful shutdown.
///
/// Wraps a cancellation token observed by the accept loop and every
/// connection task. Only the first [`Shutdown::trigger`] has an effect.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns `true` only for the call that started it.
    pub fn trigger(&self) -> bool {
        let first = !self.triggered.swap(true, Ordering::SeqCst);
        if first {
            self.token.cancel();
        }
        first
    }

    /// Token handed to tasks that must stop on shutdown.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Summary of the drain phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// All connections finished before the drain deadline.
    pub drained: bool,
    /// Connections still open when the server stopped.
    pub open_connections: u64,
}

/// Failures that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("failed to install signal handlers: {0}")]
    Signals(std::io::Error),

    #[error("failed to initialize channel: {0}")]
    Channel(#[from] ChannelError),

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(String),
}
