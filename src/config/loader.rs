//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use secrecy::SecretString;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ConfigIssue};

/// Environment variable overriding `sms.access_key_id`.
pub const ENV_ACCESS_KEY_ID: &str = "SENDMSG_ACCESS_KEY_ID";
/// Environment variable overriding `sms.access_secret`.
pub const ENV_ACCESS_SECRET: &str = "SENDMSG_ACCESS_SECRET";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ConfigIssue>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(issues) => {
                write!(f, "Validation failed: ")?;
                for (i, issue) in issues.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", issue)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file into a configuration without validating it.
pub fn read_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay credentials found in the environment.
///
/// `lookup` is `std::env::var` in production; tests pass a closure.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key_id) = lookup(ENV_ACCESS_KEY_ID).filter(|v| !v.is_empty()) {
        config.sms.access_key_id = key_id;
    }
    if let Some(secret) = lookup(ENV_ACCESS_SECRET).filter(|v| !v.is_empty()) {
        config.sms.access_secret = SecretString::new(secret);
    }
}

/// Load configuration from an optional TOML file, apply caller overrides
/// (CLI flags) and the process environment, then validate it.
pub fn load_config<F>(path: Option<&Path>, overrides: F) -> Result<ServiceConfig, ConfigError>
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };
    overrides(&mut config);
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
