//! Sync check handlers

use crate::{error::AppError, AppState, SyncReport};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::info;

fn verdict_status(report: &SyncReport) -> StatusCode {
    if report.verdict.in_sync {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// `GET /` - plain-text verdict for load balancers and health checkers.
pub async fn handle_check(State(state): State<AppState>) -> Result<Response, AppError> {
    info!("GET / - Running height-consensus check");

    let report = state.checker.check().await?;
    Ok((verdict_status(&report), report.verdict.message()).into_response())
}

/// `GET /status` - the same check with every reading, as JSON.
pub async fn handle_status(State(state): State<AppState>) -> Response {
    info!("GET /status - Running height-consensus check");

    match state.checker.check().await {
        Ok(report) => {
            let body = json!({
                "in_sync": report.verdict.in_sync,
                "message": report.verdict.message(),
                "lag_blocks": report.verdict.lag_blocks,
                "local_height": report.verdict.local_height,
                "external_max": report.verdict.external_max,
                "threshold": report.verdict.threshold,
                "sources": report.heights.external,
                "pending": report.heights.pending,
                "elapsed_ms": report.elapsed_ms,
            });
            (verdict_status(&report), Json(body)).into_response()
        }
        Err(err) => {
            err.log();
            let status = err.status_code();
            let body = Json(json!({
                "error": err.public_message(),
                "status": status.as_u16(),
            }));
            (status, body).into_response()
        }
    }
}
