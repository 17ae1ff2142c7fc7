//! Request handlers.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::channel::ChannelError;
use crate::http::request::request_id;
use crate::http::response::SendResponse;
use crate::http::server::AppState;
use crate::lifecycle::ServerState;
use crate::message::{validate, RawSendRequest, ValidationError};
use crate::observability::metrics;

/// `POST /v1/sms/send`
///
/// Validation always runs before the channel is called; a rejected payload
/// never reaches the gateway.
pub async fn send_sms(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RawSendRequest>, JsonRejection>,
) -> SendResponse {
    let start_time = Instant::now();
    let response = dispatch(&state, request_id(&headers), payload).await;
    metrics::record_request(response.status_code().as_u16(), start_time);
    response
}

async fn dispatch(
    state: &AppState,
    header_id: Option<&str>,
    payload: Result<Json<RawSendRequest>, JsonRejection>,
) -> SendResponse {
    let raw = match payload {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            let err = ValidationError::MalformedPayload(rejection.body_text());
            tracing::debug!(request_id = ?header_id, error = %err, "Rejected payload");
            return SendResponse::invalid(&err, header_id.map(str::to_string));
        }
    };

    let message = match validate(&raw, &state.catalog) {
        Ok(message) => message.with_fallback_request_id(header_id),
        Err(err) => {
            let request_id = raw.request_id.clone().or_else(|| header_id.map(str::to_string));
            tracing::debug!(request_id = ?request_id, error = %err, "Rejected payload");
            return SendResponse::invalid(&err, request_id);
        }
    };

    let request_id = message.request_id().map(str::to_string);
    let outcome = match tokio::time::timeout(state.send_timeout, state.channel.send(&message)).await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(ChannelError::Timeout(state.send_timeout)),
    };

    if let Err(err) = &outcome {
        tracing::warn!(
            request_id = ?request_id,
            channel = state.channel.name(),
            class = %err.class(),
            error = %err,
            "Send failed"
        );
    }

    SendResponse::from_outcome(&outcome, request_id)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub state: ServerState,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        state: state.lifecycle.current(),
    })
}
