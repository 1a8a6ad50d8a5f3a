//! ReservationTracker — workload → node reservation bookkeeping.
//!
//! Converts reserve/unreserve intents into ledger counter changes. Whether
//! an unreserve has any effect is decided solely by the workload's presence
//! in the reservation set, which makes releases idempotent and safe against
//! duplicate or out-of-order delivery.

use tracing::{debug, warn};

use crate::ledger::HostLedger;
use crate::types::*;

/// Reservation bookkeeping layered on a [`HostLedger`].
#[derive(Debug, Clone)]
pub struct ReservationTracker {
    ledger: HostLedger,
}

impl ReservationTracker {
    /// Create a tracker sharing the lock of `ledger`.
    pub fn new(ledger: HostLedger) -> Self {
        Self { ledger }
    }

    /// Provisionally place `workload` on `node`.
    ///
    /// Increments `reserved_count` (or `over_reserved_count` when
    /// `use_overprovision` is set). A node missing from the ledger is a
    /// silent no-op; the candidate vanished between decision and commit.
    pub fn reserve(&self, workload: &str, node: &str, use_overprovision: bool) -> ReserveEffect {
        let kind = ReservationKind::from_overprovision(use_overprovision);
        let mut state = self.ledger.lock();

        if let Some(existing) = state.reservations.get(workload) {
            let held = existing.clone();
            drop(state);
            warn!(%workload, %node, held_on = %held.node, kind = ?held.kind, "workload already holds a reservation");
            return ReserveEffect::AlreadyHeld(held);
        }

        let Some(host) = state.hosts.get_mut(node) else {
            drop(state);
            debug!(%workload, %node, "reserve against unknown node ignored");
            return ReserveEffect::UnknownNode;
        };

        match kind {
            ReservationKind::Standard => host.reserved_count += 1,
            ReservationKind::Overprovisioned => host.over_reserved_count += 1,
        }
        state.reservations.insert(
            workload.to_string(),
            ReservationEntry {
                node: node.to_string(),
                kind,
            },
        );
        drop(state);

        debug!(%workload, %node, ?kind, "workload reserved");
        ReserveEffect::Reserved(kind)
    }

    /// Release a standard reservation. No-op unless `workload` is in the
    /// reserved set. Returns true if a reservation was released.
    pub fn unreserve(&self, workload: &str, node: &str) -> bool {
        self.release_kind(workload, node, Some(ReservationKind::Standard))
    }

    /// Release an overprovisioned reservation. No-op unless `workload` is in
    /// the over-reserved set.
    pub fn unreserve_overprovisioned(&self, workload: &str, node: &str) -> bool {
        self.release_kind(workload, node, Some(ReservationKind::Overprovisioned))
    }

    /// Release whichever reservation `workload` holds. An empty `node`
    /// means the caller doesn't know it; the recorded node is used either way.
    pub fn release(&self, workload: &str, node: &str) -> bool {
        self.release_kind(workload, node, None)
    }

    /// Kind of reservation held by `workload`, if any.
    pub fn is_reserved(&self, workload: &str) -> Option<ReservationKind> {
        self.ledger
            .lock()
            .reservations
            .get(workload)
            .map(|entry| entry.kind)
    }

    /// Number of workloads currently holding a reservation.
    pub fn reservation_count(&self) -> usize {
        self.ledger.lock().reservations.len()
    }

    fn release_kind(&self, workload: &str, node: &str, only: Option<ReservationKind>) -> bool {
        let mut state = self.ledger.lock();

        let entry = match state.reservations.get(workload) {
            Some(entry) if only.is_none_or(|kind| kind == entry.kind) => entry.clone(),
            _ => return false,
        };
        state.reservations.remove(workload);
        state.release_entry(workload, &entry);
        drop(state);

        if !node.is_empty() && entry.node != node {
            warn!(
                %workload,
                %node,
                reserved_on = %entry.node,
                "release names a different node than the reservation"
            );
        }
        debug!(%workload, node = %entry.node, kind = ?entry.kind, "reservation released");
        true
    }
}
