//! Outbound delivery channels.
//!
//! # Data Flow
//! ```text
//! Message (validated)
//!     → Channel::send (one outbound call, no retries)
//!     → SendOutcome = Ok(SendReceipt) | Err(ChannelError)
//!     → ChannelError::class() → Retryable | Terminal
//! ```
//!
//! # Design Decisions
//! - All gateway semantics are interpreted here; callers only see the class
//! - Channels are shared read-only across requests (`Arc<dyn Channel>`)
//! - Retry policy belongs to whoever observes a retryable outcome

pub mod sms;
pub mod types;

use async_trait::async_trait;

use crate::message::Message;

pub use sms::SmsClient;
pub use types::{ChannelError, ErrorClass, SendOutcome, SendReceipt};

/// A delivery mechanism behind a uniform send contract.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Short channel name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Deliver one message. Performs at most one outbound call.
    async fn send(&self, message: &Message) -> SendOutcome;
}
