//! Extension-point surface the host scheduler drives.
//!
//! The host runs one scheduling cycle per pending workload: filter and
//! score over candidate nodes (in parallel), normalize the scores, then
//! reserve the winner, or unreserve it if a later stage fails. Per-cycle
//! data lives in [`CycleState`], which the host creates per cycle and
//! shares across its workers.

use std::collections::HashMap;
use std::sync::Mutex;

use pronto_ledger::NodeId;
use pronto_placement::{Admission, NodeScore};

/// Outcome of an extension point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Success,
    /// The node cannot take this workload right now.
    Unschedulable(String),
    /// Internal failure; the host aborts the cycle for this node.
    Error(String),
}

impl Status {
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Status::Success => None,
            Status::Unschedulable(reason) | Status::Error(reason) => Some(reason),
        }
    }
}

/// The workload being scheduled. Only its identity matters here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pod {
    pub name: String,
}

impl Pod {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// The host's view of a candidate node. `node` is `None` when the host's
/// cache no longer has the node object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeInfo {
    pub node: Option<NodeId>,
}

impl NodeInfo {
    pub fn new(node: &str) -> Self {
        Self {
            node: Some(node.to_string()),
        }
    }

    pub fn missing() -> Self {
        Self { node: None }
    }
}

/// Per-cycle scratch space: the admission decided by filter for each node,
/// read back by reserve.
#[derive(Debug, Default)]
pub struct CycleState {
    admissions: Mutex<HashMap<NodeId, Admission>>,
}

impl CycleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, admission: Admission) {
        self.lock()
            .insert(admission.node().to_string(), admission);
    }

    pub fn admission(&self, node: &str) -> Option<Admission> {
        self.lock().get(node).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<NodeId, Admission>> {
        self.admissions.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Common to every plugin.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
}

pub trait FilterPlugin: Plugin {
    fn filter(&self, state: &CycleState, pod: &Pod, node: &NodeInfo) -> Status;
}

pub trait ScorePlugin: Plugin {
    fn score(&self, state: &CycleState, pod: &Pod, node: &str) -> Result<i64, Status>;

    fn score_extensions(&self) -> Option<&dyn ScoreExtensions> {
        None
    }
}

/// Rescales one cycle's raw scores into the host's score range.
pub trait ScoreExtensions: Send + Sync {
    fn normalize_score(&self, state: &CycleState, pod: &Pod, scores: &mut [NodeScore]) -> Status;
}

pub trait ReservePlugin: Plugin {
    fn reserve(&self, state: &CycleState, pod: &Pod, node: &str) -> Status;

    fn unreserve(&self, state: &CycleState, pod: &Pod, node: &str);
}
