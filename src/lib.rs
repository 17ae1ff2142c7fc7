//! sendmsg receive-server library.
//!
//! Accepts send-message requests over HTTP, validates them, and delivers
//! them through a channel (SMS gateway).

pub mod channel;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod message;
pub mod net;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
