//! Domain types for the Pronto node ledger.
//!
//! `HostRecord` is the per-node view handed to decision logic (always by
//! value), `HostUpdate` is the partial telemetry write applied by ingestion,
//! and the reservation types describe workload bookkeeping outcomes.

use serde::{Deserialize, Serialize};

/// Identifier of a compute node (the scheduler's node name).
pub type NodeId = String;

/// Identifier of a workload (the scheduler's pod name).
pub type WorkloadId = String;

/// Per-placement cost assumed for a node until one is declared for it.
pub const DEFAULT_POD_COST: f64 = 0.1;

// ── Host record ────────────────────────────────────────────────────

/// Snapshot of one node's telemetry and reservation counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Workloads provisionally placed under normal accounting.
    pub reserved_count: u64,
    /// Workloads provisionally placed under the overprovisioning policy.
    pub over_reserved_count: u64,
    /// Last reported raw telemetry value.
    pub signal: f64,
    /// Last reported admission capacity.
    pub capacity: f64,
    /// Last reported secondary headroom, only usable when overprovisioning.
    pub overprovision: f64,
    /// Declared cost of a single placement on this node.
    pub pod_cost: f64,
}

impl Default for HostRecord {
    fn default() -> Self {
        Self {
            reserved_count: 0,
            over_reserved_count: 0,
            signal: 0.0,
            capacity: 0.0,
            overprovision: 0.0,
            pod_cost: DEFAULT_POD_COST,
        }
    }
}

impl HostRecord {
    /// Apply a partial update. Counters are never touched.
    pub fn apply(&mut self, update: &HostUpdate) {
        if let Some(signal) = update.signal {
            self.signal = signal;
        }
        if let Some(capacity) = update.capacity {
            self.capacity = capacity;
        }
        if let Some(overprovision) = update.overprovision {
            self.overprovision = overprovision;
        }
        if let Some(pod_cost) = update.pod_cost {
            self.pod_cost = pod_cost;
        }
    }
}

/// Partial telemetry write. Only `Some` fields are overwritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HostUpdate {
    pub signal: Option<f64>,
    pub capacity: Option<f64>,
    pub overprovision: Option<f64>,
    pub pod_cost: Option<f64>,
}

impl HostUpdate {
    /// Full measurement as carried by one streaming telemetry frame.
    pub fn measurement(signal: f64, capacity: f64, overprovision: f64) -> Self {
        Self {
            signal: Some(signal),
            capacity: Some(capacity),
            overprovision: Some(overprovision),
            pod_cost: None,
        }
    }

    pub fn with_signal(mut self, signal: f64) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_overprovision(mut self, overprovision: f64) -> Self {
        self.overprovision = Some(overprovision);
        self
    }

    pub fn with_pod_cost(mut self, pod_cost: f64) -> Self {
        self.pod_cost = Some(pod_cost);
        self
    }

    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.signal.is_none()
            && self.capacity.is_none()
            && self.overprovision.is_none()
            && self.pod_cost.is_none()
    }
}

// ── Reservations ───────────────────────────────────────────────────

/// Which accounting set a reservation lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationKind {
    /// Counted against `capacity` (`reserved_count`).
    Standard,
    /// Counted against `overprovision` (`over_reserved_count`).
    Overprovisioned,
}

impl ReservationKind {
    pub fn from_overprovision(use_overprovision: bool) -> Self {
        if use_overprovision {
            Self::Overprovisioned
        } else {
            Self::Standard
        }
    }
}

/// Membership record for one reserved workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationEntry {
    pub node: NodeId,
    pub kind: ReservationKind,
}

/// Outcome of a reserve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveEffect {
    /// Counter incremented and workload recorded.
    Reserved(ReservationKind),
    /// The node is not in the ledger; nothing changed.
    UnknownNode,
    /// The workload already holds this reservation; nothing changed.
    AlreadyHeld(ReservationEntry),
}

impl ReserveEffect {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_uses_default_pod_cost() {
        let record = HostRecord::default();
        assert_eq!(record.reserved_count, 0);
        assert_eq!(record.over_reserved_count, 0);
        assert_eq!(record.pod_cost, DEFAULT_POD_COST);
    }

    #[test]
    fn apply_only_overwrites_supplied_fields() {
        let mut record = HostRecord {
            reserved_count: 3,
            over_reserved_count: 1,
            signal: 1.0,
            capacity: 2.0,
            overprovision: 3.0,
            pod_cost: 0.5,
        };

        record.apply(&HostUpdate::default().with_capacity(7.5));

        assert_eq!(record.capacity, 7.5);
        assert_eq!(record.signal, 1.0);
        assert_eq!(record.overprovision, 3.0);
        assert_eq!(record.pod_cost, 0.5);
        assert_eq!(record.reserved_count, 3);
        assert_eq!(record.over_reserved_count, 1);
    }

    #[test]
    fn measurement_leaves_pod_cost_unset() {
        let update = HostUpdate::measurement(1.0, 2.0, 3.0);
        assert_eq!(update.pod_cost, None);
        assert!(!update.is_empty());
        assert!(HostUpdate::default().is_empty());
    }
}
