//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags (clap)           config file (TOML)         environment
//!     │                          │                          │
//!     │                          → loader.rs (parse) ←──────┘ credentials
//!     │                          → validation.rs (semantic checks)
//!     └──── overrides ─────────→ ServiceConfig (validated, immutable)
//!                                → passed by reference to constructors
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no process-wide mutable flags
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets come from the file or the environment and are never logged

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig, SmsConfig, TemplateConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ConfigIssue};
