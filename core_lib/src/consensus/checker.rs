use super::aggregator::{FanOutAggregator, HeightSet};
use super::verdict::Verdict;
use crate::config::AppConfig;
use crate::error::Result;
use crate::sources::{ExternalSource, HeightSource, NodeClient};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub heights: HeightSet,
    pub verdict: Verdict,
    pub elapsed_ms: u64,
}

/// Runs one height-consensus check per call. Holds no per-request state.
pub struct SyncChecker {
    aggregator: FanOutAggregator,
    threshold: i64,
}

impl SyncChecker {
    pub fn new(aggregator: FanOutAggregator, threshold: i64) -> Self {
        Self {
            aggregator,
            threshold,
        }
    }

    /// Wires the node client and the configured external sources around one
    /// shared HTTP client.
    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let node: Arc<dyn HeightSource> = Arc::new(NodeClient::new(config.node.url.clone(), client.clone()));
        let externals = config
            .sources
            .iter()
            .map(|source| Arc::new(ExternalSource::from_config(source, client.clone())) as Arc<dyn HeightSource>)
            .collect();

        Self::new(
            FanOutAggregator::new(node, externals, config.fanout_deadline()),
            config.check.threshold,
        )
    }

    pub async fn check(&self) -> Result<SyncReport> {
        let start = Instant::now();
        let heights = self.aggregator.gather().await?;

        info!(
            node_height = heights.local_height,
            external = ?heights.external,
            pending = ?heights.pending,
            "Queried heights."
        );

        let verdict = heights.verdict(self.threshold)?;
        if verdict.in_sync {
            info!(lag_blocks = verdict.lag_blocks, "The node is fully in sync.");
        } else {
            warn!("The node is {} blocks behind!", verdict.lag_blocks);
        }

        Ok(SyncReport {
            heights,
            verdict,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}
