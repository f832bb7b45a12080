//! Core library for the node height-consensus health check: height sources,
//! fan-out aggregation, verdict and the HTTP surface.

pub mod config;
pub mod consensus;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod sources;

pub use config::{AppConfig, Overrides, SourceConfig};
pub use consensus::{FanOutAggregator, HeightReading, HeightSet, SyncChecker, SyncReport, Verdict};
pub use error::{AppError, Result, SourceError};
pub use handlers::create_routes;
pub use sources::{build_client, ExternalSource, HeightEncoding, HeightSource, NodeClient};

use axum::Router;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub checker: Arc<SyncChecker>,
}

impl AppState {
    pub fn new(checker: SyncChecker) -> Self {
        Self {
            app_name: "heightcheck".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checker: Arc::new(checker),
        }
    }

    /// Builds the shared HTTP client and the checker from `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = build_client(config.source_timeout())
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::new(SyncChecker::from_config(config, client)))
    }
}

pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new().merge(create_routes());

    let router = middleware::with_request_timeout(router, request_timeout);
    let router = middleware::with_request_logging(router);

    router.with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
