//! Request validation and normalization.
//!
//! # Responsibilities
//! - Reject incomplete or malformed send requests before any network call
//! - Canonicalize the recipient number
//! - Check template parameters against the registered template shape
//!
//! # Design Decisions
//! - Pure function: no I/O, deterministic for identical input
//! - Idempotent: validating the raw form of a `Message` yields the same `Message`

use std::collections::{BTreeMap, BTreeSet};

use crate::config::ServiceConfig;
use crate::message::types::{Message, RawSendRequest, ValidationError};

/// Characters stripped from recipient numbers.
const RECIPIENT_SEPARATORS: &[char] = &[' ', '-', '(', ')', '.'];

/// Shortest accepted number, country code included.
const MIN_RECIPIENT_DIGITS: usize = 7;

/// E.164 upper bound.
const MAX_RECIPIENT_DIGITS: usize = 15;

/// Mainland China country code, dropped from mainland numbers.
const MAINLAND_COUNTRY_CODE: &str = "86";

/// Registered template shapes.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, BTreeSet<String>>,
    strict: bool,
}

impl TemplateCatalog {
    /// Build a catalog from `(template code, parameter keys)` pairs.
    pub fn new<I, K>(templates: I, strict: bool) -> Self
    where
        I: IntoIterator<Item = (String, K)>,
        K: IntoIterator<Item = String>,
    {
        let templates = templates
            .into_iter()
            .map(|(code, keys)| {
                let keys: BTreeSet<String> =
                    keys.into_iter().map(|k| k.trim().to_string()).collect();
                (code.trim().to_string(), keys)
            })
            .collect();
        Self { templates, strict }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config
                .templates
                .iter()
                .map(|(code, shape)| (code.clone(), shape.params.clone())),
            config.strict_templates,
        )
    }

    /// Expected parameter keys for a template, if registered.
    pub fn expected_keys(&self, template_code: &str) -> Option<&BTreeSet<String>> {
        self.templates.get(template_code)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Turn a raw send request into a [`Message`] or explain why it is rejected.
pub fn validate(
    raw: &RawSendRequest,
    catalog: &TemplateCatalog,
) -> Result<Message, ValidationError> {
    let recipient = raw
        .recipient
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(ValidationError::MissingRecipient)?;
    let recipient = normalize_recipient(recipient)
        .ok_or_else(|| ValidationError::InvalidRecipient(recipient.to_string()))?;

    let template_code = raw
        .template_code
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ValidationError::MissingTemplateCode)?;
    if !template_code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidTemplateCode(template_code.to_string()));
    }

    let mut params = BTreeMap::new();
    for (key, value) in &raw.params {
        let key = key.trim();
        if key.is_empty() {
            return Err(ValidationError::BlankParameterKey);
        }
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::BlankParameterValue(key.to_string()));
        }
        if params.insert(key.to_string(), value.to_string()).is_some() {
            return Err(ValidationError::DuplicateParameterKey(key.to_string()));
        }
    }

    match catalog.expected_keys(template_code) {
        Some(expected) => {
            if !expected.iter().eq(params.keys()) {
                return Err(ValidationError::ParameterMismatch {
                    template: template_code.to_string(),
                    expected: expected.iter().cloned().collect(),
                    actual: params.keys().cloned().collect(),
                });
            }
        }
        None if catalog.is_strict() => {
            return Err(ValidationError::UnknownTemplate(template_code.to_string()));
        }
        None => {}
    }

    let request_id = raw
        .request_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    Ok(Message::new(
        recipient,
        template_code.to_string(),
        params,
        request_id,
    ))
}

/// Canonical digits-only form of a phone number, or `None` if it is not one.
///
/// Separators and a leading `+`/`00` are dropped, and the mainland country
/// code is removed from mainland mobile numbers.
pub fn normalize_recipient(input: &str) -> Option<String> {
    let compact: String = input
        .trim()
        .chars()
        .filter(|c| !RECIPIENT_SEPARATORS.contains(c))
        .collect();
    let digits = compact
        .strip_prefix('+')
        .or_else(|| compact.strip_prefix("00"))
        .unwrap_or(compact.as_str());

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = match digits.strip_prefix(MAINLAND_COUNTRY_CODE) {
        Some(rest) if is_mainland_mobile(rest) => rest,
        _ => digits,
    };

    if !(MIN_RECIPIENT_DIGITS..=MAX_RECIPIENT_DIGITS).contains(&digits.len())
        || digits.starts_with('0')
    {
        return None;
    }
    Some(digits.to_string())
}

fn is_mainland_mobile(digits: &str) -> bool {
    let bytes = digits.as_bytes();
    bytes.len() == 11 && bytes[0] == b'1' && (b'3'..=b'9').contains(&bytes[1])
}
