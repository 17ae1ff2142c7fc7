//! Request signing for the SMS gateway (RPC signature v1, HMAC-SHA1).
//!
//! ```text
//! canonical     = sorted params, pct(key) "=" pct(value), joined by "&"
//! string_to_sign = "GET" "&" pct("/") "&" pct(canonical)
//! signature     = base64(hmac_sha1(secret + "&", string_to_sign))
//! ```
//!
//! `pct` is RFC 3986 encoding: only `A-Z a-z 0-9 - _ . ~` stay literal.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

/// Timestamp format the gateway expects (ISO 8601, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Freshness inputs of a signed request.
///
/// Fixing the stamp makes signing fully deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStamp {
    pub timestamp: DateTime<Utc>,
    pub nonce: String,
}

impl RequestStamp {
    /// Current time with a random UUID nonce.
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            nonce: Uuid::new_v4().to_string(),
        }
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// RFC 3986 percent-encoding.
pub fn percent_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Sorted, encoded `key=value` pairs joined by `&`.
pub fn canonical_query(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(method: &str, canonical: &str) -> String {
    format!(
        "{}&{}&{}",
        method,
        percent_encode("/"),
        percent_encode(canonical)
    )
}

/// Base64 HMAC-SHA1 of `string_to_sign` keyed with `secret + "&"`.
pub fn sign(secret: &str, string_to_sign: &str) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha1::new_from_slice(format!("{}&", secret).as_bytes())?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
