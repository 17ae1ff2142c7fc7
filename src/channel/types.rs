//! Channel outcome and error types.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Result of one send attempt on a channel.
pub type SendOutcome = Result<SendReceipt, ChannelError>;

/// Acknowledgement returned by a gateway that accepted a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// Gateway-assigned message id.
    pub message_id: Option<String>,
    /// Gateway request id, useful when contacting the provider.
    pub gateway_request_id: Option<String>,
}

/// Whether resubmitting the same message could succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    Retryable,
    Terminal,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Retryable => "retryable",
            ErrorClass::Terminal => "terminal",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors a channel can report for a send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The gateway did not answer within the per-call timeout.
    #[error("gateway call timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, reset, or a broken response body.
    #[error("gateway transport failed: {0}")]
    Transport(String),

    /// The gateway refused the message; resubmitting it unchanged will fail again.
    #[error("gateway rejected the message: {code}: {message}")]
    Rejected { code: String, message: String },

    /// The gateway reported a transient failure on its side.
    #[error("gateway temporarily unavailable: {code}: {message}")]
    Unavailable { code: String, message: String },

    /// The outbound request could not be built from config and message.
    #[error("gateway request could not be built: {0}")]
    InvalidRequest(String),
}

impl ChannelError {
    /// Classification surfaced to callers. Every variant maps to exactly one class.
    pub fn class(&self) -> ErrorClass {
        match self {
            ChannelError::Timeout(_)
            | ChannelError::Transport(_)
            | ChannelError::Unavailable { .. } => ErrorClass::Retryable,
            ChannelError::Rejected { .. } | ChannelError::InvalidRequest(_) => ErrorClass::Terminal,
        }
    }

    /// Gateway error code, when the gateway supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ChannelError::Rejected { code, .. } | ChannelError::Unavailable { code, .. } => {
                Some(code)
            }
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_partitions_all_variants() {
        let cases = [
            (ChannelError::Timeout(Duration::from_secs(10)), ErrorClass::Retryable),
            (ChannelError::Transport("refused".into()), ErrorClass::Retryable),
            (
                ChannelError::Unavailable {
                    code: "isp.SYSTEM_ERROR".into(),
                    message: "busy".into(),
                },
                ErrorClass::Retryable,
            ),
            (
                ChannelError::Rejected {
                    code: "isv.MOBILE_NUMBER_ILLEGAL".into(),
                    message: "bad number".into(),
                },
                ErrorClass::Terminal,
            ),
            (ChannelError::InvalidRequest("bad url".into()), ErrorClass::Terminal),
        ];
        for (err, class) in cases {
            assert_eq!(err.class(), class, "{err}");
            assert_eq!(err.is_retryable(), class == ErrorClass::Retryable);
        }
    }

    #[test]
    fn code_is_exposed_for_gateway_errors() {
        let err = ChannelError::Rejected {
            code: "isv.SMS_TEMPLATE_ILLEGAL".into(),
            message: "template".into(),
        };
        assert_eq!(err.code(), Some("isv.SMS_TEMPLATE_ILLEGAL"));
        assert_eq!(ChannelError::Transport("x".into()).code(), None);
    }

    #[test]
    fn class_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ErrorClass::Retryable).unwrap(),
            r#""retryable""#
        );
        assert_eq!(ErrorClass::Terminal.to_string(), "terminal");
    }

    #[test]
    fn error_display() {
        let err = ChannelError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "gateway call timed out after 10s");
    }
}
