//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order (metrics, channel, signals)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Signal handlers are installed before binding so no signal is missed
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use crate::channel::{Channel, SmsClient};
use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::{LifecycleError, Shutdown, ShutdownReport};
use crate::lifecycle::signals::{forward_signals, SignalListener};
use crate::lifecycle::state::Lifecycle;
use crate::net::Listener;
use crate::observability::metrics;

/// Start the receive-server and block until it has drained.
pub async fn start(config: &ServiceConfig) -> Result<ShutdownReport, LifecycleError> {
    if let Some(address) = &config.observability.metrics_address {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| LifecycleError::Metrics(format!("invalid address '{}': {}", address, e)))?;
        metrics::init_metrics(addr).map_err(|e| LifecycleError::Metrics(e.to_string()))?;
    }

    let channel: Arc<dyn Channel> =
        Arc::new(SmsClient::new(config.sms.clone(), config.timeouts.call())?);

    let shutdown = Shutdown::new();
    let signals = SignalListener::install().map_err(LifecycleError::Signals)?;
    let signal_task = forward_signals(signals, shutdown.clone());

    let listener = match Listener::bind(&config.listener).await {
        Ok(listener) => listener,
        Err(e) => {
            signal_task.abort();
            return Err(e.into());
        }
    };

    let server = HttpServer::new(config, channel, Lifecycle::new());
    let report = server.run(listener, shutdown).await;
    signal_task.abort();
    report
}
