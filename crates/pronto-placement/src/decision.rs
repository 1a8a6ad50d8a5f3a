//! DecisionAdapter — the seam the scheduler's extension points call into.
//!
//! Filter returns a typed [`Admission`] carrying the accounting decided for
//! that node; commit requires it back. The decision made at filter time is
//! therefore exactly the one consumed at commit time, by construction.

use pronto_ledger::{Engine, NodeId, ReservationKind, ReserveEffect};
use tracing::{debug, trace};

use crate::error::{DecisionError, DecisionResult};
use crate::policy::AdmissionConfig;
use crate::scorer;

/// Proof that a node passed the filter, and under which accounting.
///
/// Only [`DecisionAdapter::filter`] creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    node: NodeId,
    kind: ReservationKind,
}

impl Admission {
    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn kind(&self) -> ReservationKind {
        self.kind
    }

    /// Whether the placement must be counted against overprovision headroom.
    pub fn requires_overprovision(&self) -> bool {
        self.kind == ReservationKind::Overprovisioned
    }
}

/// Why a node was filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub node: NodeId,
    pub reason: String,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Filter / score / commit over a shared [`Engine`].
#[derive(Debug, Clone)]
pub struct DecisionAdapter {
    engine: Engine,
    config: AdmissionConfig,
}

impl DecisionAdapter {
    /// Create an adapter over `engine` with the given policy.
    pub fn new(engine: Engine, config: AdmissionConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Check whether `node` can take one more placement right now.
    pub fn filter(&self, node: &str) -> Result<Admission, Rejection> {
        let Some(record) = self.engine.ledger().get(node) else {
            return Err(Rejection {
                node: node.to_string(),
                reason: "node not found".to_string(),
            });
        };

        trace!(
            %node,
            capacity = record.capacity,
            reserved = record.reserved_count,
            overprovision = record.overprovision,
            over_reserved = record.over_reserved_count,
            "pronto filter"
        );

        match scorer::admit(node, &record, &self.config) {
            Ok(kind) => Ok(Admission {
                node: node.to_string(),
                kind,
            }),
            Err(reason) => Err(Rejection {
                node: node.to_string(),
                reason,
            }),
        }
    }

    /// Raw preference for `node`; higher is better. Reads only.
    pub fn score(&self, node: &str) -> DecisionResult<i64> {
        let record = self
            .engine
            .ledger()
            .get(node)
            .ok_or_else(|| DecisionError::NodeNotFound(node.to_string()))?;

        let score = scorer::score(&record, &self.config);
        trace!(
            %node,
            capacity = record.capacity,
            reserved = record.reserved_count,
            score,
            "pronto score"
        );
        Ok(score)
    }

    /// Reserve `workload` on the admitted node under the admitted accounting.
    ///
    /// A node that left the ledger since filter time is reported as
    /// `NodeNotFound`; nothing is reserved in that case.
    pub fn commit(&self, workload: &str, admission: &Admission) -> DecisionResult<ReserveEffect> {
        let effect = self.engine.reservations().reserve(
            workload,
            &admission.node,
            admission.requires_overprovision(),
        );

        match effect {
            ReserveEffect::UnknownNode => Err(DecisionError::NodeNotFound(admission.node.clone())),
            effect => {
                debug!(%workload, node = %admission.node, ?effect, "placement committed");
                Ok(effect)
            }
        }
    }

    /// Undo a commit after the scheduler aborted the placement.
    pub fn abort(&self, workload: &str, node: &str) -> bool {
        let released = self.engine.reservations().release(workload, node);
        if released {
            debug!(%workload, %node, "placement aborted; reservation released");
        }
        released
    }
}
