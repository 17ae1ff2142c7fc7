//! Ingress response body and status mapping.
//!
//! | outcome                      | status | classification |
//! |------------------------------|--------|----------------|
//! | accepted by the gateway      | 200    | -              |
//! | malformed or invalid payload | 400    | `validation`   |
//! | terminal gateway failure     | 422    | `terminal`     |
//! | retryable gateway failure    | 503    | `retryable`    |
//! | request exceeded its timeout | 503    | `retryable`    |
//! | handler panic                | 500    | `internal`     |

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::channel::{ChannelError, ErrorClass, SendOutcome, SendReceipt};
use crate::message::ValidationError;

/// Error code reported when a request exceeds its overall timeout.
pub const CODE_REQUEST_TIMEOUT: &str = "RequestTimeout";

/// Top-level result of a send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    /// The gateway accepted the message.
    Accepted,
    /// The message will not be delivered as submitted.
    Rejected,
    /// Delivery failed for a reason the client may retry.
    Failed,
}

/// Why a request was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Validation,
    Terminal,
    Retryable,
    Internal,
}

impl From<ErrorClass> for FailureKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Retryable => FailureKind::Retryable,
            ErrorClass::Terminal => FailureKind::Terminal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub classification: FailureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// JSON body of `POST /v1/sms/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    pub status: DispatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl SendResponse {
    pub fn accepted(receipt: &SendReceipt, request_id: Option<String>) -> Self {
        Self {
            status: DispatchStatus::Accepted,
            message_id: receipt.message_id.clone(),
            request_id,
            error: None,
        }
    }

    pub fn invalid(err: &ValidationError, request_id: Option<String>) -> Self {
        Self {
            status: DispatchStatus::Rejected,
            message_id: None,
            request_id,
            error: Some(ErrorBody {
                classification: FailureKind::Validation,
                code: None,
                message: err.to_string(),
            }),
        }
    }

    pub fn failed(err: &ChannelError, request_id: Option<String>) -> Self {
        let classification = FailureKind::from(err.class());
        let status = match classification {
            FailureKind::Terminal => DispatchStatus::Rejected,
            _ => DispatchStatus::Failed,
        };
        Self {
            status,
            message_id: None,
            request_id,
            error: Some(ErrorBody {
                classification,
                code: err.code().map(str::to_string),
                message: err.to_string(),
            }),
        }
    }

    /// The whole request, body upload included, ran past `limit`.
    pub fn timed_out(limit: Duration) -> Self {
        Self {
            status: DispatchStatus::Failed,
            message_id: None,
            request_id: None,
            error: Some(ErrorBody {
                classification: FailureKind::Retryable,
                code: Some(CODE_REQUEST_TIMEOUT.to_string()),
                message: format!("request not completed within {:?}", limit),
            }),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: DispatchStatus::Failed,
            message_id: None,
            request_id: None,
            error: Some(ErrorBody {
                classification: FailureKind::Internal,
                code: None,
                message: message.into(),
            }),
        }
    }

    pub fn from_outcome(outcome: &SendOutcome, request_id: Option<String>) -> Self {
        match outcome {
            Ok(receipt) => Self::accepted(receipt, request_id),
            Err(err) => Self::failed(err, request_id),
        }
    }

    /// HTTP status for this body.
    pub fn status_code(&self) -> StatusCode {
        match self.error.as_ref().map(|e| e.classification) {
            None => StatusCode::OK,
            Some(FailureKind::Validation) => StatusCode::BAD_REQUEST,
            Some(FailureKind::Terminal) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(FailureKind::Retryable) => StatusCode::SERVICE_UNAVAILABLE,
            Some(FailureKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SendResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_maps_to_ok() {
        let receipt = SendReceipt {
            message_id: Some("biz-1".into()),
            gateway_request_id: Some("gw-1".into()),
        };
        let response = SendResponse::from_outcome(&Ok(receipt), Some("req-1".into()));
        assert_eq!(response.status_code(), StatusCode::OK);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "accepted", "message_id": "biz-1", "request_id": "req-1"})
        );
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let response = SendResponse::invalid(&ValidationError::MissingRecipient, None);
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.status, DispatchStatus::Rejected);
        let error = response.error.unwrap();
        assert_eq!(error.classification, FailureKind::Validation);
        assert_eq!(error.message, "recipient is required");
    }

    #[test]
    fn channel_errors_map_by_class() {
        let terminal = ChannelError::Rejected {
            code: "isv.MOBILE_NUMBER_ILLEGAL".into(),
            message: "bad".into(),
        };
        let response = SendResponse::failed(&terminal, None);
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.status, DispatchStatus::Rejected);
        assert_eq!(
            response.error.unwrap().code.as_deref(),
            Some("isv.MOBILE_NUMBER_ILLEGAL")
        );

        let retryable = ChannelError::Timeout(Duration::from_secs(10));
        let response = SendResponse::failed(&retryable, None);
        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status, DispatchStatus::Failed);
        assert_eq!(response.error.unwrap().classification, FailureKind::Retryable);
    }

    #[test]
    fn request_timeout_is_retryable() {
        let response = SendResponse::timed_out(Duration::from_secs(20));
        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        let error = response.error.unwrap();
        assert_eq!(error.classification, FailureKind::Retryable);
        assert_eq!(error.code.as_deref(), Some(CODE_REQUEST_TIMEOUT));
    }

    #[test]
    fn internal_maps_to_server_error() {
        let response = SendResponse::internal("boom");
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["classification"], "internal");
        assert!(json.get("message_id").is_none());
    }
}
