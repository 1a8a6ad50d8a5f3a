//! pronto-scheduler — the Pronto plugin as seen by a host scheduler.
//!
//! Exposes the scheduling-cycle extension points (filter, score, normalize,
//! reserve, unreserve) over a shared `Engine`, and releases provisional
//! reservations when workloads start running or go away.
//!
//! # Architecture
//!
//! ```text
//! host scheduler worker pool
//!   ├── Filter(pod, node)      ─► DecisionAdapter::filter ─► CycleState (Admission per node)
//!   ├── Score(pod, node)       ─► DecisionAdapter::score
//!   ├── NormalizeScore(scores) ─► normalize_scores
//!   ├── Reserve(pod, node)     ─► CycleState admission ─► DecisionAdapter::commit
//!   └── Unreserve(pod, node)   ─► DecisionAdapter::abort
//!
//! workload watch ─► WorkloadEvent channel ─► LifecycleEventAdapter ─► ReservationTracker::release
//! ```

pub mod error;
pub mod framework;
pub mod lifecycle;
pub mod plugin;

pub use error::{SchedulerError, SchedulerResult};
pub use framework::{CycleState, FilterPlugin, NodeInfo, Plugin, Pod, ReservePlugin, ScoreExtensions, ScorePlugin, Status};
pub use lifecycle::{LifecycleEventAdapter, PodPhase, WorkloadEvent};
pub use plugin::{NAME, ProntoPlugin};
