//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, connection limit > 0)
//! - Check the gateway endpoint and credentials are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("listener.max_connections must be greater than zero")]
    ZeroConnections,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("sms.gateway_url '{url}' is invalid: {reason}")]
    InvalidGatewayUrl { url: String, reason: String },

    #[error("sms.{0} is required")]
    MissingCredential(&'static str),

    #[error("templates.{template} declares a blank parameter key")]
    BlankTemplateKey { template: String },
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.listener.host.trim().is_empty() {
        issues.push(ConfigIssue::EmptyHost);
    }
    if config.listener.max_connections == 0 {
        issues.push(ConfigIssue::ZeroConnections);
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("read_secs", timeouts.read_secs),
        ("write_secs", timeouts.write_secs),
        ("idle_secs", timeouts.idle_secs),
        ("call_secs", timeouts.call_secs),
        ("drain_secs", timeouts.drain_secs),
    ] {
        if value == 0 {
            issues.push(ConfigIssue::ZeroTimeout(name));
        }
    }

    match url::Url::parse(&config.sms.gateway_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => issues.push(ConfigIssue::InvalidGatewayUrl {
            url: config.sms.gateway_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => issues.push(ConfigIssue::InvalidGatewayUrl {
            url: config.sms.gateway_url.clone(),
            reason: e.to_string(),
        }),
    }

    if config.sms.access_key_id.trim().is_empty() {
        issues.push(ConfigIssue::MissingCredential("access_key_id"));
    }
    if config.sms.access_secret.expose_secret().is_empty() {
        issues.push(ConfigIssue::MissingCredential("access_secret"));
    }
    if config.sms.sign_name.trim().is_empty() {
        issues.push(ConfigIssue::MissingCredential("sign_name"));
    }

    for (template, shape) in &config.templates {
        if shape.params.iter().any(|key| key.trim().is_empty()) {
            issues.push(ConfigIssue::BlankTemplateKey {
                template: template.clone(),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
