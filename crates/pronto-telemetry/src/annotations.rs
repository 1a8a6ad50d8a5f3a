//! Annotation poller — poll-based telemetry for nodes without an agent.
//!
//! Each poll lists node objects from a [`NodeSource`] and writes two
//! annotations into the ledger:
//!
//! - `pronto/signal` → both `signal` and `capacity` (default 0)
//! - `pronto/pod-cost` → `pod_cost` (default 0.1)
//!
//! Only annotations that are present are written, so a node that is also
//! fed by a streaming agent keeps its streamed values unless the node
//! object says otherwise. A listed node with no annotations at all is only
//! registered, which gives it the defaults above if it is new. Unparsable
//! values fall back to their defaults; a bad annotation never stops the
//! poll. Nodes this poller reported earlier that vanish from the listing
//! are removed from the ledger. Nodes fed only by streaming agents are
//! left alone.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use pronto_ledger::{DEFAULT_POD_COST, HostLedger, HostUpdate, NodeId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{TelemetryError, TelemetryResult};
use crate::session::shutdown_requested;

/// Annotation carrying the node's admission signal.
pub const SIGNAL_ANNOTATION: &str = "pronto/signal";
/// Annotation carrying the node's per-placement cost.
pub const POD_COST_ANNOTATION: &str = "pronto/pod-cost";
/// Signal assumed when the annotation is absent or unparsable.
pub const DEFAULT_SIGNAL: f64 = 0.0;

/// Minimal node object: a name and its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeObject {
    pub name: String,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl NodeObject {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            annotations: HashMap::new(),
        }
    }

    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations.insert(key.to_string(), value.to_string());
        self
    }

    /// `pronto/signal`, or 0 when absent or unparsable.
    pub fn signal(&self) -> f64 {
        self.annotation_f64(SIGNAL_ANNOTATION, DEFAULT_SIGNAL)
            .unwrap_or(DEFAULT_SIGNAL)
    }

    /// `pronto/pod-cost`, or 0.1 when absent or unparsable.
    pub fn pod_cost(&self) -> f64 {
        self.annotation_f64(POD_COST_ANNOTATION, DEFAULT_POD_COST)
            .unwrap_or(DEFAULT_POD_COST)
    }

    /// Ledger update derived from the annotations present on this node.
    /// Empty when the node carries neither annotation.
    pub fn update(&self) -> HostUpdate {
        let mut update = HostUpdate::default();
        if let Some(signal) = self.annotation_f64(SIGNAL_ANNOTATION, DEFAULT_SIGNAL) {
            update = update.with_signal(signal).with_capacity(signal);
        }
        if let Some(pod_cost) = self.annotation_f64(POD_COST_ANNOTATION, DEFAULT_POD_COST) {
            update = update.with_pod_cost(pod_cost);
        }
        update
    }

    /// `None` when the annotation is absent; `default` when it can't be parsed.
    fn annotation_f64(&self, key: &str, default: f64) -> Option<f64> {
        let raw = self.annotations.get(key)?;
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                debug!(node = %self.name, annotation = key, value = %raw, default, "unparsable annotation");
                Some(default)
            }
        }
    }
}

/// Lists the cluster's node objects.
#[async_trait]
pub trait NodeSource: Send + Sync {
    async fn list_nodes(&self) -> anyhow::Result<Vec<NodeObject>>;
}

/// In-memory node listing that can be replaced at any time.
#[derive(Debug, Default)]
pub struct StaticNodeSource {
    nodes: RwLock<Vec<NodeObject>>,
}

impl StaticNodeSource {
    pub fn new(nodes: Vec<NodeObject>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Replace the listing returned by the next poll.
    pub fn set_nodes(&self, nodes: Vec<NodeObject>) {
        *self.nodes.write().unwrap_or_else(|p| p.into_inner()) = nodes;
    }
}

#[async_trait]
impl NodeSource for StaticNodeSource {
    async fn list_nodes(&self) -> anyhow::Result<Vec<NodeObject>> {
        Ok(self.nodes.read().unwrap_or_else(|p| p.into_inner()).clone())
    }
}

/// Node listing read from a JSON file (`[{"name": ..., "annotations": {...}}]`)
/// on every poll.
#[derive(Debug, Clone)]
pub struct FileNodeSource {
    path: PathBuf,
}

impl FileNodeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl NodeSource for FileNodeSource {
    async fn list_nodes(&self) -> anyhow::Result<Vec<NodeObject>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let nodes: Vec<NodeObject> = serde_json::from_str(&content)?;
        Ok(nodes)
    }
}

/// Result of one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub updated: usize,
    pub removed: Vec<NodeId>,
}

/// Periodically copies node annotations into the ledger.
pub struct AnnotationPoller {
    ledger: HostLedger,
    source: Arc<dyn NodeSource>,
    interval: Duration,
    /// Nodes reported by the previous successful poll.
    seen: HashSet<NodeId>,
}

impl AnnotationPoller {
    pub fn new(ledger: HostLedger, source: Arc<dyn NodeSource>, interval: Duration) -> Self {
        Self {
            ledger,
            source,
            interval,
            seen: HashSet::new(),
        }
    }

    /// List nodes once and apply their annotations.
    pub async fn poll_once(&mut self) -> TelemetryResult<PollReport> {
        let nodes = self
            .source
            .list_nodes()
            .await
            .map_err(|e| TelemetryError::Source(e.to_string()))?;

        let mut current = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            let update = node.update();
            if update.is_empty() {
                self.ledger.register(&node.name);
            } else {
                self.ledger.upsert(&node.name, update);
            }
            current.insert(node.name.clone());
        }

        let mut removed: Vec<NodeId> = self.seen.difference(&current).cloned().collect();
        removed.sort();
        for node in &removed {
            self.ledger.remove(node);
        }
        self.seen = current;

        debug!(updated = nodes.len(), removed = removed.len(), "annotation poll complete");
        Ok(PollReport {
            updated: nodes.len(),
            removed,
        })
    }

    /// Poll on an interval until `shutdown` turns true.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        info!(interval = ?self.interval, "annotation poller started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!(error = %e, "annotation poll failed; retrying next interval");
                    }
                }
                _ = shutdown_requested(&mut shutdown) => break,
            }
        }

        info!("annotation poller stopped");
    }
}
