//! pronto-ledger — in-memory node ledger for the Pronto admission engine.
//!
//! Tracks, per compute node, the last telemetry measurement reported for it
//! and the number of workloads provisionally placed on it during the current
//! scheduling cycles.
//!
//! # Architecture
//!
//! ```text
//! Engine (Clone, Send + Sync)
//!   ├── HostLedger          node-id → HostRecord
//!   │     get / upsert / register / remove / snapshot
//!   └── ReservationTracker  workload-id → ReservationEntry
//!         reserve / unreserve / unreserve_overprovisioned / release
//! ```
//!
//! Both halves share one `Mutex<LedgerState>`. Every operation takes the
//! lock for a single map/counter update and never across I/O, so telemetry
//! sessions, lifecycle watchers and scheduling callbacks can all call in
//! concurrently.

pub mod engine;
pub mod ledger;
pub mod reservations;
pub mod types;

pub use engine::Engine;
pub use ledger::HostLedger;
pub use reservations::ReservationTracker;
pub use types::*;
