//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, Axum router, middleware)
//!     → request.rs (request ID lookup)
//!     → handlers.rs (decode, validate, call channel)
//!     → response.rs (outcome → status + JSON body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{DispatchStatus, ErrorBody, FailureKind, SendResponse};
pub use server::{build_router, AppState, HttpServer};
