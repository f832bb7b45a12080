//! Bounded-time scatter/gather over the external height sources.

use crate::error::{AppError, Result};
use crate::sources::HeightSource;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// One source's answer. `height` is `None` when the source failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeightReading {
    pub source: String,
    pub height: Option<i64>,
}

impl HeightReading {
    pub fn success(source: impl Into<String>, height: i64) -> Self {
        Self {
            source: source.into(),
            height: Some(height),
        }
    }

    pub fn failure(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            height: None,
        }
    }
}

/// Readings gathered for one request. The local height is authoritative;
/// external readings are unordered.
#[derive(Debug, Clone, Serialize)]
pub struct HeightSet {
    pub local_source: String,
    pub local_height: i64,
    pub external: Vec<HeightReading>,
    /// Sources that had not reported when the deadline passed.
    pub pending: Vec<String>,
}

impl HeightSet {
    pub fn new(local_source: impl Into<String>, local_height: i64) -> Self {
        Self {
            local_source: local_source.into(),
            local_height,
            external: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn max_external(&self) -> Option<i64> {
        self.external.iter().filter_map(|reading| reading.height).max()
    }

    /// External sources that produced a height.
    pub fn responded(&self) -> usize {
        self.external.iter().filter(|r| r.height.is_some()).count()
    }

    pub fn attempted(&self) -> usize {
        self.external.len() + self.pending.len()
    }
}

pub struct FanOutAggregator {
    local: Arc<dyn HeightSource>,
    externals: Vec<Arc<dyn HeightSource>>,
    deadline: Duration,
}

impl FanOutAggregator {
    pub fn new(
        local: Arc<dyn HeightSource>,
        externals: Vec<Arc<dyn HeightSource>>,
        deadline: Duration,
    ) -> Self {
        Self {
            local,
            externals,
            deadline,
        }
    }

    /// Queries the local node, then every external source concurrently.
    ///
    /// A local failure aborts before any external query starts. External
    /// failures only drop that source's contribution. Sources still running
    /// when the deadline passes are left behind and listed as pending.
    pub async fn gather(&self) -> Result<HeightSet> {
        debug!("Querying the node over JSON-RPC...");
        let local_height = self.local.fetch_height().await.map_err(|e| {
            error!(source = self.local.name(), error = %e, "JSON-RPC request to the node failed!");
            AppError::LocalNode(e)
        })?;
        debug!(height = local_height, "Node queried.");

        let mut set = HeightSet::new(self.local.name(), local_height);
        let deadline = Instant::now() + self.deadline;

        let (tx, mut rx) = mpsc::channel::<(usize, HeightReading)>(self.externals.len().max(1));
        for (index, source) in self.externals.iter().enumerate() {
            let source = Arc::clone(source);
            let tx = tx.clone();
            tokio::spawn(async move {
                let reading = query_source(source.as_ref()).await;
                // The receiver is gone once the deadline passed.
                let _ = tx.send((index, reading)).await;
            });
        }
        drop(tx);

        let mut reported = vec![false; self.externals.len()];
        while set.external.len() < self.externals.len() {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some((index, reading))) => {
                    reported[index] = true;
                    set.external.push(reading);
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        deadline_ms = self.deadline.as_millis() as u64,
                        collected = set.external.len(),
                        expected = self.externals.len(),
                        "Deadline reached before all external sources reported"
                    );
                    break;
                }
            }
        }

        set.pending = self
            .externals
            .iter()
            .zip(&reported)
            .filter(|(_, done)| !**done)
            .map(|(source, _)| source.name().to_string())
            .collect();

        Ok(set)
    }
}

async fn query_source(source: &dyn HeightSource) -> HeightReading {
    let name = source.name();
    debug!(source = name, "Querying external source...");

    match source.fetch_height().await {
        Ok(height) => {
            debug!(source = name, height, "External source queried.");
            HeightReading::success(name, height)
        }
        Err(e) => {
            error!(source = name, error = %e, "Unable to read block height from external source");
            HeightReading::failure(name)
        }
    }
}
