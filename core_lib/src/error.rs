//! Application error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of a single height source. Never fatal on its own for external
/// sources; fatal for the local node.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Non-2xx response code: {status}. Response: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response is not a JSON object")]
    NotAnObject,

    #[error("Missing field '{0}' in response")]
    MissingField(String),

    #[error("Field '{field}' is not a {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("Unable to convert '{value}' to a block number")]
    InvalidNumber { value: String },

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("JSON-RPC response carried no result")]
    EmptyResult,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JSON-RPC request to the node failed: {0}")]
    LocalNode(#[source] SourceError),

    #[error("No external source reported a block height ({responded} of {attempted} responded)")]
    InsufficientExternalData { attempted: usize, responded: usize },

    #[error("Request timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::LocalNode(_)
            | AppError::InsufficientExternalData { .. }
            | AppError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text written to the client. Diagnostic detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::LocalNode(_) => "JSON-RPC request to the node failed!",
            AppError::InsufficientExternalData { .. } => {
                "Unable to read block height from any external source!"
            }
            AppError::Timeout => "Request timed out.",
            AppError::Config(_) => "Internal server error",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Records the error once as it is turned into a response. A local node
    /// failure was already logged with its source where it happened.
    pub fn log(&self) {
        match self {
            AppError::LocalNode(err) => tracing::debug!(error = %err, "Answering with node failure"),
            AppError::InsufficientExternalData { attempted, responded } => {
                tracing::error!(attempted, responded, "No external block height available");
            }
            AppError::Timeout => tracing::warn!("Request exceeded the configured timeout"),
            AppError::Config(msg) => tracing::error!("Configuration error: {}", msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), self.public_message()).into_response()
    }
}
