//! HostLedger — node-id → HostRecord map behind a single mutex.
//!
//! The ledger is the only place node records live. Readers always get a
//! copy of a record, never a reference into the map, so a concurrent
//! telemetry write can't be observed half-applied.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info};

use crate::types::*;

/// Everything guarded by the ledger lock.
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub(crate) hosts: HashMap<NodeId, HostRecord>,
    /// Reserved and over-reserved sets. One entry per workload keeps the
    /// two sets disjoint.
    pub(crate) reservations: HashMap<WorkloadId, ReservationEntry>,
}

impl LedgerState {
    /// Undo the counter effect of a reservation entry on its node.
    ///
    /// A counter already at zero stays at zero; that only happens when the
    /// release path is out of step with the reserve path, so it is logged.
    pub(crate) fn release_entry(&mut self, workload: &str, entry: &ReservationEntry) {
        let Some(host) = self.hosts.get_mut(&entry.node) else {
            debug!(%workload, node = %entry.node, "released reservation for node no longer in ledger");
            return;
        };

        let counter = match entry.kind {
            ReservationKind::Standard => &mut host.reserved_count,
            ReservationKind::Overprovisioned => &mut host.over_reserved_count,
        };

        match counter.checked_sub(1) {
            Some(n) => *counter = n,
            None => {
                error!(
                    %workload,
                    node = %entry.node,
                    kind = ?entry.kind,
                    "reservation counter underflow; clamped at zero"
                );
            }
        }
    }
}

/// Thread-safe node ledger. Cloning yields another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct HostLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl HostLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the ledger lock.
    ///
    /// The guarded data is plain counters and floats, so a panic in another
    /// holder can't leave it structurally broken; poisoning is ignored.
    pub(crate) fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the record for `node`, if the node is known.
    pub fn get(&self, node: &str) -> Option<HostRecord> {
        self.lock().hosts.get(node).copied()
    }

    /// Whether `node` is in the ledger.
    pub fn contains(&self, node: &str) -> bool {
        self.lock().hosts.contains_key(node)
    }

    /// Apply a partial telemetry update, creating the record if needed.
    pub fn upsert(&self, node: &str, update: HostUpdate) {
        let mut state = self.lock();
        let created = !state.hosts.contains_key(node);
        state
            .hosts
            .entry(node.to_string())
            .or_default()
            .apply(&update);
        drop(state);

        if created {
            info!(%node, "node added to ledger from telemetry");
        }
    }

    /// Add a zero-valued record for `node`. Known nodes are left alone.
    ///
    /// Returns true if the node was newly registered.
    pub fn register(&self, node: &str) -> bool {
        let mut state = self.lock();
        if state.hosts.contains_key(node) {
            return false;
        }
        state.hosts.insert(node.to_string(), HostRecord::default());
        drop(state);

        info!(%node, "node registered");
        true
    }

    /// Drop `node` and every reservation entry that points at it.
    ///
    /// Returns true if the node existed.
    pub fn remove(&self, node: &str) -> bool {
        let mut state = self.lock();
        let existed = state.hosts.remove(node).is_some();
        let before = state.reservations.len();
        state.reservations.retain(|_, entry| entry.node != node);
        let dropped = before - state.reservations.len();
        drop(state);

        if existed {
            info!(%node, dropped_reservations = dropped, "node removed from ledger");
        }
        existed
    }

    /// Consistent copy of every record, sorted by node id.
    pub fn snapshot(&self) -> Vec<(NodeId, HostRecord)> {
        let state = self.lock();
        let mut hosts: Vec<(NodeId, HostRecord)> = state
            .hosts
            .iter()
            .map(|(node, record)| (node.clone(), *record))
            .collect();
        drop(state);

        hosts.sort_by(|a, b| a.0.cmp(&b.0));
        hosts
    }

    /// Number of known nodes.
    pub fn len(&self) -> usize {
        self.lock().hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().hosts.is_empty()
    }
}
