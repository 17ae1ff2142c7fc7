//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! receive-server. All types derive Serde traits for deserialization from
//! config files.

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// Root configuration for the receive-server.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (host, port, connection limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// SMS gateway credentials and endpoint.
    pub sms: SmsConfig,

    /// Expected parameter keys per template code.
    pub templates: BTreeMap<String, TemplateConfig>,

    /// Reject template codes missing from `templates`.
    pub strict_templates: bool,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host for service startup.
    pub host: String,

    /// Port for service startup. `0` asks the OS for an ephemeral port.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8990,
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to receive a request's headers.
    pub read_secs: u64,

    /// Time allowed to produce a response once the request is read.
    pub write_secs: u64,

    /// Keep-alive idle time before a connection is closed.
    pub idle_secs: u64,

    /// Per-call timeout for the outbound gateway request.
    pub call_secs: u64,

    /// Upper bound on the drain phase during shutdown.
    pub drain_secs: u64,
}

impl TimeoutConfig {
    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn call(&self) -> Duration {
        Duration::from_secs(self.call_secs)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_secs(self.drain_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 10,
            write_secs: 10,
            idle_secs: 10,
            call_secs: 10,
            drain_secs: 30,
        }
    }
}

/// SMS gateway configuration.
///
/// The access secret is wrapped in [`SecretString`] so `Debug` output never
/// contains it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    /// Gateway access key id.
    pub access_key_id: String,

    /// Gateway access secret.
    pub access_secret: SecretString,

    /// Gateway base URL.
    pub gateway_url: String,

    /// Registered SMS signature name.
    pub sign_name: String,

    /// Gateway region.
    pub region_id: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            access_secret: SecretString::new(String::new()),
            gateway_url: "https://dysmsapi.aliyuncs.com/".to_string(),
            sign_name: String::new(),
            region_id: "cn-hangzhou".to_string(),
        }
    }
}

/// Expected shape of one SMS template.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TemplateConfig {
    /// Parameter keys the template expects, in any order.
    pub params: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Optional file to write logs to instead of stdout.
    pub log_path: Option<String>,

    /// Prometheus endpoint bind address. Metrics are off when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_path: None,
            metrics_address: None,
        }
    }
}
