//! Server state machine.
//!
//! ```text
//! NotStarted → Listening → Draining → Stopped
//! ```
//!
//! Transitions are one-way and only to the next state; anything else is
//! ignored. Observers subscribe through a `watch` channel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

/// Process-wide serving state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    NotStarted,
    Listening,
    Draining,
    Stopped,
}

impl ServerState {
    /// The only state this one may move to.
    pub fn next(&self) -> Option<ServerState> {
        match self {
            ServerState::NotStarted => Some(ServerState::Listening),
            ServerState::Listening => Some(ServerState::Draining),
            ServerState::Draining => Some(ServerState::Stopped),
            ServerState::Stopped => None,
        }
    }
}

/// Shared handle on the server state.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<ServerState>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ServerState::NotStarted);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> ServerState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.tx.subscribe()
    }

    /// Move to `target` if it directly follows the current state.
    ///
    /// Returns `false` and leaves the state untouched otherwise.
    pub fn advance(&self, target: ServerState) -> bool {
        self.tx.send_if_modified(|state| {
            if state.next() == Some(target) {
                tracing::info!(from = ?*state, to = ?target, "Server state changed");
                *state = target;
                true
            } else {
                false
            }
        })
    }

    /// Wait until the state reaches at least `target`.
    pub async fn reached(&self, target: ServerState) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|state| *state >= target).await;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
