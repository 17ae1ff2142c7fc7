//! Message types shared by the ingress handler and the channels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Send-message payload as received on the wire, before validation.
///
/// Every field is optional so that a missing field is reported as a
/// [`ValidationError`] instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RawSendRequest {
    /// Phone number of the recipient.
    pub recipient: Option<String>,
    /// Gateway template code.
    pub template_code: Option<String>,
    /// Template parameters.
    pub params: BTreeMap<String, String>,
    /// Client-assigned id, forwarded to the gateway as `OutId`.
    pub request_id: Option<String>,
}

/// A validated, normalized message ready for a channel.
///
/// Built only by [`crate::message::validate`]; fields are read through
/// accessors so parameters cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    recipient: String,
    template_code: String,
    params: BTreeMap<String, String>,
    request_id: Option<String>,
}

impl Message {
    pub(crate) fn new(
        recipient: String,
        template_code: String,
        params: BTreeMap<String, String>,
        request_id: Option<String>,
    ) -> Self {
        Self {
            recipient,
            template_code,
            params,
            request_id,
        }
    }

    /// Canonical recipient number (digits only).
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn template_code(&self) -> &str {
        &self.template_code
    }

    /// Template parameters ordered by key.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Attach a request id when the payload did not carry one.
    pub fn with_fallback_request_id(mut self, request_id: Option<&str>) -> Self {
        if self.request_id.is_none() {
            self.request_id = request_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
        }
        self
    }
}

impl From<&Message> for RawSendRequest {
    fn from(message: &Message) -> Self {
        Self {
            recipient: Some(message.recipient.clone()),
            template_code: Some(message.template_code.clone()),
            params: message.params.clone(),
            request_id: message.request_id.clone(),
        }
    }
}

/// Reasons a send request is rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("recipient is required")]
    MissingRecipient,

    #[error("recipient '{0}' is not a valid phone number")]
    InvalidRecipient(String),

    #[error("template code is required")]
    MissingTemplateCode,

    #[error("template code '{0}' contains invalid characters")]
    InvalidTemplateCode(String),

    #[error("template code '{0}' is not registered")]
    UnknownTemplate(String),

    #[error("template parameter keys must not be blank")]
    BlankParameterKey,

    #[error("template parameter '{0}' must not be blank")]
    BlankParameterValue(String),

    #[error("template parameter '{0}' is given more than once")]
    DuplicateParameterKey(String),

    #[error("template '{template}' expects parameters {expected:?}, got {actual:?}")]
    ParameterMismatch {
        template: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}
