//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Init metrics → Build channel → Install signals → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain connections → Report
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown (later signals ignored)
//!
//! State (state.rs):
//!     NotStarted → Listening → Draining → Stopped
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: connections left after the deadline are abandoned

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{LifecycleError, Shutdown, ShutdownReport};
pub use signals::{forward_signals, SignalListener};
pub use startup::start;
pub use state::{Lifecycle, ServerState};
