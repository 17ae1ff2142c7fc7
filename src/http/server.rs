//! HTTP server setup and connection serving.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Configure HTTP/1.1 and HTTP/2 support
//! - Wire up middleware (request ID, tracing, timeouts, panic recovery)
//! - Accept connections until shutdown, then drain them

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{BoxError, Router};
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use tower::timeout::error::Elapsed;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::channel::Channel;
use crate::config::{ServiceConfig, TimeoutConfig};
use crate::http::handlers;
use crate::http::request::request_id;
use crate::http::response::SendResponse;
use crate::lifecycle::{Lifecycle, LifecycleError, ServerState, Shutdown, ShutdownReport};
use crate::message::TemplateCatalog;
use crate::net::{ConnectionTracker, Listener, ListenerError};

/// Pause after a failed accept before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub channel: Arc<dyn Channel>,
    pub catalog: Arc<TemplateCatalog>,
    pub lifecycle: Lifecycle,
    /// Upper bound on producing a send response.
    pub send_timeout: Duration,
}

/// HTTP server for the send-message API.
pub struct HttpServer {
    router: Router,
    timeouts: TimeoutConfig,
    lifecycle: Lifecycle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig, channel: Arc<dyn Channel>, lifecycle: Lifecycle) -> Self {
        let catalog = TemplateCatalog::from_config(config);
        if catalog.is_strict() && catalog.is_empty() {
            tracing::warn!("Strict template checking with no templates configured, every send will be rejected");
        }
        tracing::debug!(
            templates = catalog.len(),
            strict = catalog.is_strict(),
            "Template catalog loaded"
        );

        let state = AppState {
            channel,
            catalog: Arc::new(catalog),
            lifecycle: lifecycle.clone(),
            send_timeout: config.timeouts.write(),
        };

        Self {
            router: build_router(&config.timeouts, state),
            timeouts: config.timeouts.clone(),
            lifecycle,
        }
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Connection builder shared by every accepted connection.
    fn connection_builder(&self) -> auto::Builder<TokioExecutor> {
        let idle = self.timeouts.idle();
        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.timeouts.read().min(idle));
        builder
            .http2()
            .timer(TokioTimer::new())
            .keep_alive_interval(idle)
            .keep_alive_timeout(idle);
        builder
    }

    /// Serve connections from `listener` until `shutdown` fires, then drain.
    ///
    /// Moves the lifecycle through `Listening`, `Draining` and `Stopped`.
    /// Connections still open after the drain deadline are abandoned and
    /// counted in the report.
    pub async fn run(
        self,
        listener: Listener,
        shutdown: Shutdown,
    ) -> Result<ShutdownReport, LifecycleError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        let builder = self.connection_builder();
        let tracker = ConnectionTracker::new();
        let token = shutdown.token();

        self.lifecycle.advance(ServerState::Listening);
        tracing::info!(
            address = %addr,
            max_connections = listener.max_connections(),
            "HTTP server listening"
        );

        loop {
            let (stream, peer_addr, permit) = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(ListenerError::Closed) => return Err(ListenerError::Closed.into()),
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        continue;
                    }
                },
            };

            let guard = tracker.track();
            let builder = builder.clone();
            let service = TowerToHyperService::new(self.router.clone());
            let token = token.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let conn = builder.serve_connection(TokioIo::new(stream), service);
                tokio::pin!(conn);

                let mut closing = false;
                loop {
                    tokio::select! {
                        result = conn.as_mut() => {
                            if let Err(e) = result {
                                tracing::debug!(
                                    connection_id = %guard.id(),
                                    peer_addr = %peer_addr,
                                    error = %e,
                                    "Connection ended with error"
                                );
                            }
                            break;
                        }
                        _ = token.cancelled(), if !closing => {
                            closing = true;
                            conn.as_mut().graceful_shutdown();
                        }
                    }
                }
                drop(guard);
            });
        }

        drop(listener);
        self.lifecycle.advance(ServerState::Draining);
        tracing::info!(
            open_connections = tracker.active_count(),
            drain_timeout_secs = self.timeouts.drain_secs,
            "Stopped accepting, draining connections"
        );

        let drained = tokio::time::timeout(self.timeouts.drain(), tracker.wait_idle())
            .await
            .is_ok();
        let open_connections = tracker.active_count();
        if !drained {
            tracing::warn!(open_connections, "Drain deadline passed with connections open");
        }

        self.lifecycle.advance(ServerState::Stopped);
        tracing::info!("HTTP server stopped");

        Ok(ShutdownReport {
            drained,
            open_connections,
        })
    }
}

/// Build the Axum router with all middleware layers.
///
/// A request that takes longer than read + write in total, including a
/// stalled body upload, is answered with a retryable JSON error.
pub fn build_router(timeouts: &TimeoutConfig, state: AppState) -> Router {
    let request_timeout = timeouts.read() + timeouts.write();

    Router::new()
        .route("/v1/sms/send", post(handlers::send_sms))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    timeout_response(err, request_timeout)
                }))
                .timeout(request_timeout),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Span for one request, carrying its request ID.
fn request_span(request: &Request) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = request_id(request.headers()).unwrap_or("-"),
    )
}

fn timeout_response(err: BoxError, limit: Duration) -> SendResponse {
    if err.is::<Elapsed>() {
        tracing::warn!(limit_secs = limit.as_secs(), "Request timed out");
        SendResponse::timed_out(limit)
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        SendResponse::internal("internal error")
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = detail, "Handler panicked");
    SendResponse::internal("internal error").into_response()
}
