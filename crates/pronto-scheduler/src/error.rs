//! Scheduler plugin error types.

use pronto_placement::DecisionError;
use thiserror::Error;

/// Errors that can occur inside the plugin's extension points.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("decision error: {0}")]
    Decision(#[from] DecisionError),

    /// Reserve was called for a node that filter never admitted in this
    /// cycle.
    #[error("no admission recorded for node {node} in this cycle (filter/reserve mismatch)")]
    MissingAdmission { node: String },

    /// The workload is still reserved on a different node.
    #[error("workload {workload} cannot be reserved on {node}: still reserved on {held_on}")]
    HeldElsewhere {
        workload: String,
        node: String,
        held_on: String,
    },
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
