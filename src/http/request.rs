//! Request metadata helpers.
//!
//! Request IDs are assigned by `SetRequestIdLayer` before any handler runs,
//! so handlers only read them back.

use axum::http::HeaderMap;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID from the headers, if present and printable.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}
