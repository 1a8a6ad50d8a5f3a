//! pronto-placement — admission decisions over the Pronto node ledger.
//!
//! Scores and filters candidate nodes from live telemetry minus what is
//! already provisionally reserved on them, and commits the chosen placement
//! back into the ledger.
//!
//! # Components
//!
//! - **`policy`** — Admission configuration (threshold, cost model, overprovisioning toggle)
//! - **`scorer`** — Pure headroom, admission and score arithmetic plus score normalization
//! - **`decision`** — `DecisionAdapter`: filter → `Admission` → commit / abort

pub mod decision;
pub mod error;
pub mod policy;
pub mod scorer;

pub use decision::{Admission, DecisionAdapter, Rejection};
pub use error::{DecisionError, DecisionResult};
pub use policy::{AdmissionConfig, CostModel, Threshold};
pub use scorer::{MAX_NODE_SCORE, MIN_NODE_SCORE, NodeScore, normalize_scores};
