use crate::sources::HeightEncoding;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "heightcheck.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub node: NodeConfig,
    pub check: CheckConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Blocks the node may trail the external maximum before it is reported
    /// as behind. Zero is strict, negative requires the node to be ahead.
    pub threshold: i64,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    pub field: String,
    pub encoding: HeightEncoding,
}

/// Values given on the command line. Anything set here wins over the file
/// and environment layers.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub node: Option<String>,
    pub timeout: Option<Duration>,
    pub threshold: Option<i64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            node: NodeConfig::default(),
            check: CheckConfig::default(),
            sources: default_sources(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8500,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".to_string(),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            threshold: 10,
            timeout_ms: 30_000,
        }
    }
}

pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "blockcypher".to_string(),
            url: "https://api.blockcypher.com/v1/eth/main".to_string(),
            field: "height".to_string(),
            encoding: HeightEncoding::Number,
        },
        SourceConfig {
            name: "etherscan".to_string(),
            url: "https://api.etherscan.io/api?module=proxy&action=eth_blockNumber".to_string(),
            field: "result".to_string(),
            encoding: HeightEncoding::HexString,
        },
        SourceConfig {
            name: "nanopool".to_string(),
            url: "https://api.nanopool.org/v1/eth/network/lastblocknumber/".to_string(),
            field: "data".to_string(),
            encoding: HeightEncoding::Number,
        },
    ]
}

impl AppConfig {
    /// Layers defaults, an optional TOML file and `APP_` environment
    /// variables (`__` separates nested keys, e.g. `APP_CHECK__THRESHOLD`).
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(PathBuf::from(path)).required(true));
            }
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn apply_overrides(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(node) = overrides.node {
            self.node.url = node;
        }
        if let Some(timeout) = overrides.timeout {
            self.check.timeout_ms = timeout.as_millis() as u64;
        }
        if let Some(threshold) = overrides.threshold {
            self.check.threshold = threshold;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if reqwest::Url::parse(&self.node.url).is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid node URL: {}",
                self.node.url
            )));
        }

        if self.check.timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.is_empty() {
                return Err(ConfigError::Message(
                    "External source name cannot be empty".to_string(),
                ));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Duplicate external source name: {}",
                    source.name
                )));
            }
            if reqwest::Url::parse(&source.url).is_err() {
                return Err(ConfigError::Message(format!(
                    "Invalid URL for external source '{}': {}",
                    source.name, source.url
                )));
            }
            if source.field.is_empty() {
                return Err(ConfigError::Message(format!(
                    "External source '{}' has no height field",
                    source.name
                )));
            }
        }

        if self.sources.is_empty() {
            tracing::warn!("No external sources configured - every check will report missing external data");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Ceiling the listener enforces on a whole request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.check.timeout_ms)
    }

    /// Shared deadline for the external fan-out.
    pub fn fanout_deadline(&self) -> Duration {
        self.request_timeout() / 2
    }

    /// Per-request timeout of the shared HTTP client. The local query plus
    /// the fan-out stay under `request_timeout`.
    pub fn source_timeout(&self) -> Duration {
        self.request_timeout() / 3
    }
}
