use super::sync::{handle_check, handle_status};
use crate::AppState;
use axum::{routing::get, Router};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_check))
        .route("/status", get(handle_status))
}
