//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sendmsg_requests_total` (counter): ingress responses by status
//! - `sendmsg_send_total` (counter): channel outcomes by channel and result
//! - `sendmsg_send_duration_seconds` (histogram): gateway call latency
//! - `sendmsg_active_connections` (gauge): open client connections
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::channel::SendOutcome;

/// Install the global recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one ingress response.
pub fn record_request(status: u16, start_time: Instant) {
    counter!("sendmsg_requests_total", "status" => status.to_string()).increment(1);
    histogram!("sendmsg_request_duration_seconds").record(start_time.elapsed().as_secs_f64());
}

/// Record one channel send outcome.
pub fn record_send(channel: &'static str, outcome: &SendOutcome, start_time: Instant) {
    let result = match outcome {
        Ok(_) => "accepted",
        Err(e) => e.class().as_str(),
    };
    counter!("sendmsg_send_total", "channel" => channel, "result" => result).increment(1);
    histogram!("sendmsg_send_duration_seconds", "channel" => channel)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn set_active_connections(count: u64) {
    gauge!("sendmsg_active_connections").set(count as f64);
}
