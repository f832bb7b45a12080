//! Main entry point for the heightcheck binary

use anyhow::Result;
use clap::Parser;
use heightcheck_core::{create_app, run_server, AppConfig, AppState, Overrides};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "heightcheck",
    version,
    about = "HTTP health check comparing an Ethereum node's block height with external sources"
)]
struct Cli {
    #[arg(long, env = "HEIGHTCHECK_CONFIG", help = "Path to a TOML configuration file")]
    config: Option<PathBuf>,
    #[arg(long, env = "HEIGHTCHECK_NODE", help = "The URL of the Ethereum node to check for health")]
    node: Option<String>,
    #[arg(long, env = "HEIGHTCHECK_HOST", help = "The address on which to listen")]
    host: Option<String>,
    #[arg(long, env = "HEIGHTCHECK_PORT", help = "The HTTP port on which to listen")]
    port: Option<u16>,
    #[arg(
        long,
        env = "HEIGHTCHECK_TIMEOUT",
        value_parser = parse_duration,
        help = "Overall per-request deadline, e.g. 30s or 1500ms"
    )]
    timeout: Option<Duration>,
    #[arg(
        long,
        env = "HEIGHTCHECK_THRESHOLD",
        allow_negative_numbers = true,
        help = "The maximum acceptable number of blocks to allow the node to be behind"
    )]
    threshold: Option<i64>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            node: self.node.clone(),
            timeout: self.timeout,
            threshold: self.threshold,
        }
    }
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    duration_str::parse(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let config = AppConfig::load_from(cli.config.as_deref())
        .and_then(|config| config.apply_overrides(cli.overrides()))
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Node URL: {}", config.node.url);
    info!(
        threshold = config.check.threshold,
        request_timeout_ms = config.request_timeout().as_millis() as u64,
        fanout_deadline_ms = config.fanout_deadline().as_millis() as u64,
        source_timeout_ms = config.source_timeout().as_millis() as u64,
        "Check settings"
    );
    for source in &config.sources {
        info!(name = %source.name, url = %source.url, field = %source.field, encoding = %source.encoding, "External source");
    }

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let state = AppState::from_config(&config)?;
    info!("App: {} v{}", state.app_name, state.version);

    let app = create_app(state, config.request_timeout());

    run_server(app, addr)
        .await
        .map_err(|e| anyhow::anyhow!("Server error on {}: {}", addr, e))?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "heightcheck=debug,heightcheck_core=debug,tower_http=debug,axum=info".into()
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
