//! Gateway response decoding.
//!
//! The gateway answers with a JSON body such as
//! `{"Code":"OK","Message":"OK","BizId":"...","RequestId":"..."}`. The body is
//! decoded once, here, into a [`GatewayReply`]; nothing downstream looks at
//! gateway JSON again.

use serde::Deserialize;

use crate::channel::types::{ChannelError, SendReceipt};

/// Success code of the gateway.
const CODE_OK: &str = "OK";

/// Code used when the gateway body cannot be decoded.
pub const CODE_UNREADABLE: &str = "UnreadableResponse";

/// Gateway codes describing conditions that clear up on their own.
const TRANSIENT_CODES: &[&str] = &[
    "ServiceUnavailable",
    "InternalError",
    "isv.BUSINESS_LIMIT_CONTROL",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireReply {
    code: Option<String>,
    message: Option<String>,
    biz_id: Option<String>,
    request_id: Option<String>,
}

/// Decoded gateway reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayReply {
    Accepted {
        biz_id: Option<String>,
        request_id: Option<String>,
    },
    Rejected {
        code: String,
        message: String,
    },
    Transient {
        code: String,
        message: String,
    },
}

impl GatewayReply {
    /// Decode an HTTP status and body.
    pub fn decode(status: u16, body: &[u8]) -> Self {
        let wire: WireReply = match serde_json::from_slice(body) {
            Ok(wire) => wire,
            Err(e) => return Self::unreadable(status, &e.to_string()),
        };

        let Some(code) = wire.code.filter(|c| !c.is_empty()) else {
            return Self::unreadable(status, "missing Code field");
        };
        let message = wire.message.unwrap_or_default();

        if code == CODE_OK {
            GatewayReply::Accepted {
                biz_id: wire.biz_id,
                request_id: wire.request_id,
            }
        } else if is_transient_code(&code) || status >= 500 {
            GatewayReply::Transient { code, message }
        } else {
            GatewayReply::Rejected { code, message }
        }
    }

    /// An undecodable body is transient for 2xx/5xx statuses and a rejection otherwise.
    fn unreadable(status: u16, detail: &str) -> Self {
        let code = CODE_UNREADABLE.to_string();
        let message = format!("HTTP {}: {}", status, detail);
        if (200..300).contains(&status) || status >= 500 {
            GatewayReply::Transient { code, message }
        } else {
            GatewayReply::Rejected { code, message }
        }
    }

    pub fn into_outcome(self) -> Result<SendReceipt, ChannelError> {
        match self {
            GatewayReply::Accepted { biz_id, request_id } => Ok(SendReceipt {
                message_id: biz_id,
                gateway_request_id: request_id,
            }),
            GatewayReply::Rejected { code, message } => {
                Err(ChannelError::Rejected { code, message })
            }
            GatewayReply::Transient { code, message } => {
                Err(ChannelError::Unavailable { code, message })
            }
        }
    }
}

/// Platform-side (`isp.*`), throttling, and availability codes.
pub fn is_transient_code(code: &str) -> bool {
    code.starts_with("isp.") || code.starts_with("Throttling") || TRANSIENT_CODES.contains(&code)
}
