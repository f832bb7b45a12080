//! Request logging middleware configuration

use axum::{body::Body, Router};
use http::{Request, Response, StatusCode};
use std::time::Duration;
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{info_span, Span};

/// Wraps `router` in a `TraceLayer` that opens one span per request and logs
/// its outcome. A 503 is an expected answer from this service: it is logged
/// as a warning and never as a failure.
pub fn with_request_logging<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    version = ?request.version(),
                )
            })
            .on_request(|request: &Request<Body>, _span: &Span| {
                tracing::info!(
                    "started processing request {} {}",
                    request.method(),
                    request.uri().path()
                );
            })
            .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                let status = response.status();
                let latency_ms = latency.as_millis() as u64;

                if status.is_success() {
                    tracing::info!(status = status.as_u16(), latency_ms, "request completed successfully");
                } else if status == StatusCode::SERVICE_UNAVAILABLE {
                    tracing::warn!(status = status.as_u16(), latency_ms, "node reported unhealthy");
                } else {
                    tracing::error!(status = status.as_u16(), latency_ms, "error response");
                }
            })
            .on_failure(|error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                if is_unexpected_failure(&error) {
                    tracing::error!(
                        latency_ms = latency.as_millis() as u64,
                        error = %error,
                        "request failed"
                    );
                }
            }),
    )
}

/// 5xx classifications worth an error log. The service answers 503 whenever
/// the node is unhealthy, and `on_response` already reports that.
fn is_unexpected_failure(class: &ServerErrorsFailureClass) -> bool {
    !matches!(class, ServerErrorsFailureClass::StatusCode(StatusCode::SERVICE_UNAVAILABLE))
}
