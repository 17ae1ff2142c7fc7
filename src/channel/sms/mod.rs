//! SMS channel backed by the Aliyun-style `SendSms` RPC API.
//!
//! # Data Flow
//! ```text
//! Message + SmsConfig + RequestStamp
//!     → signer.rs (canonical query, HMAC-SHA1 signature)
//!     → client.rs (one GET under the call timeout)
//!     → reply.rs (JSON body → GatewayReply → SendOutcome)
//! ```
//!
//! # Security Constraints
//! - The access secret only ever feeds the HMAC key
//! - Recipients are masked in logs

pub mod client;
pub mod reply;
pub mod signer;

pub use client::{mask_recipient, SignedRequest, SmsClient};
pub use reply::GatewayReply;
pub use signer::RequestStamp;
