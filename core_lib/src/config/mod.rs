pub mod settings;

pub use settings::{default_sources, AppConfig, CheckConfig, NodeConfig, Overrides, ServerConfig, SourceConfig};
