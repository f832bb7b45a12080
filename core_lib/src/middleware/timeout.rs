//! Listener-level ceiling on request duration

use crate::error::AppError;
use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use std::time::Duration;
use tower::{timeout::error::Elapsed, BoxError, ServiceBuilder};

/// Aborts any request running longer than `timeout` with a 503
/// "Request timed out." response, independent of the check's own deadline.
pub fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_timeout_error))
            .timeout(timeout),
    )
}

async fn handle_timeout_error(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        AppError::Timeout.into_response()
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}
