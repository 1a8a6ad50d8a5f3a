//! Engine — the explicitly constructed owner of ledger and reservations.
//!
//! Every adapter (decision logic, telemetry sessions, lifecycle watcher)
//! receives a clone of the same `Engine` at construction time. Tests build
//! one engine per case.

use crate::ledger::HostLedger;
use crate::reservations::ReservationTracker;

/// Shared handle to one ledger and its reservation tracker.
#[derive(Debug, Clone)]
pub struct Engine {
    ledger: HostLedger,
    reservations: ReservationTracker,
}

impl Engine {
    /// Create an engine with an empty ledger.
    pub fn new() -> Self {
        let ledger = HostLedger::new();
        let reservations = ReservationTracker::new(ledger.clone());
        Self {
            ledger,
            reservations,
        }
    }

    pub fn ledger(&self) -> &HostLedger {
        &self.ledger
    }

    pub fn reservations(&self) -> &ReservationTracker {
        &self.reservations
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
