//! Message subsystem: wire payload, validated message, and validation rules.
//!
//! # Data Flow
//! ```text
//! JSON body
//!     → RawSendRequest (every field optional)
//!     → validator.rs (trim, canonical recipient, template shape)
//!     → Message (immutable) | ValidationError
//!     → channel
//! ```

pub mod types;
pub mod validator;

pub use types::{Message, RawSendRequest, ValidationError};
pub use validator::{normalize_recipient, validate, TemplateCatalog};
