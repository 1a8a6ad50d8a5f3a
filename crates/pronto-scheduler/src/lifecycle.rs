//! Workload lifecycle adapter.
//!
//! A provisional reservation only bridges the gap until the node's own
//! telemetry reflects the workload. Once the workload is observed running,
//! finishes, fails or is deleted, its reservation is released.

use pronto_ledger::{NodeId, ReservationTracker, WorkloadId};
use pronto_telemetry::shutdown_requested;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Workload phase as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }

    /// Whether a workload in this phase no longer needs a reservation.
    fn releases(self) -> bool {
        self == PodPhase::Running || self.is_terminal()
    }
}

/// A change observed on a workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadEvent {
    Updated {
        workload: WorkloadId,
        node: NodeId,
        old_phase: PodPhase,
        new_phase: PodPhase,
    },
    Deleted {
        workload: WorkloadId,
        node: NodeId,
    },
}

/// Releases reservations in response to workload events.
#[derive(Debug, Clone)]
pub struct LifecycleEventAdapter {
    reservations: ReservationTracker,
}

impl LifecycleEventAdapter {
    pub fn new(reservations: ReservationTracker) -> Self {
        Self { reservations }
    }

    /// Apply one event. Returns true if a reservation was released.
    ///
    /// Updates for unbound workloads (empty node) and duplicate
    /// notifications are no-ops. A delete releases whatever the workload
    /// holds, even if the notification names no node.
    pub fn handle(&self, event: &WorkloadEvent) -> bool {
        let (workload, node) = match event {
            WorkloadEvent::Updated {
                workload,
                node,
                old_phase,
                new_phase,
            } => {
                if node.is_empty() || old_phase == new_phase || !new_phase.releases() {
                    return false;
                }
                (workload, node)
            }
            WorkloadEvent::Deleted { workload, node } => (workload, node),
        };

        let released = self.reservations.release(workload, node);
        if released {
            debug!(%workload, %node, ?event, "reservation released by lifecycle event");
        }
        released
    }

    /// Consume events until the channel closes or shutdown is signalled.
    pub async fn run(self, mut events: mpsc::Receiver<WorkloadEvent>, mut shutdown: watch::Receiver<bool>) {
        info!("lifecycle adapter started");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle(&event);
                    }
                    None => break,
                },
                _ = shutdown_requested(&mut shutdown) => break,
            }
        }

        info!("lifecycle adapter stopped");
    }
}
