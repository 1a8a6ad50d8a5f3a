//! Headroom arithmetic, admission checks and score normalization.
//!
//! Everything here is a pure function of a `HostRecord` snapshot and the
//! admission policy; nothing touches the ledger.

use pronto_ledger::{HostRecord, ReservationKind};

use crate::policy::{AdmissionConfig, CostModel, Threshold};

/// Lowest score handed back to the scheduler after normalization.
pub const MIN_NODE_SCORE: i64 = 0;
/// Highest score handed back to the scheduler after normalization.
pub const MAX_NODE_SCORE: i64 = 100;

/// Raw or normalized score for one candidate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeScore {
    pub node: String,
    pub score: i64,
}

/// Headroom consumed by a single reservation on this node.
pub fn unit_cost(record: &HostRecord, config: &AdmissionConfig) -> f64 {
    match config.cost_model {
        CostModel::Unit => 1.0,
        CostModel::Declared => record.pod_cost,
    }
}

/// Minimum headroom this node must exceed.
pub fn threshold(record: &HostRecord, config: &AdmissionConfig) -> f64 {
    match config.threshold {
        Threshold::Fixed(epsilon) => epsilon,
        Threshold::PodCost => record.pod_cost,
    }
}

/// Capacity left after standard reservations.
pub fn headroom(record: &HostRecord, config: &AdmissionConfig) -> f64 {
    record.capacity - record.reserved_count as f64 * unit_cost(record, config)
}

/// Overprovision headroom left after overprovisioned reservations.
pub fn overprovision_headroom(record: &HostRecord, config: &AdmissionConfig) -> f64 {
    record.overprovision - record.over_reserved_count as f64 * unit_cost(record, config)
}

/// Decide whether `record` admits one more placement.
///
/// Returns the accounting the placement must be reserved under, or a
/// human-readable reason naming the comparison that failed.
pub fn admit(node: &str, record: &HostRecord, config: &AdmissionConfig) -> Result<ReservationKind, String> {
    let needed = threshold(record, config);
    let standard = headroom(record, config);
    if standard > needed {
        return Ok(ReservationKind::Standard);
    }

    let mut reason = format!(
        "Node {node} does not meet signal requirements: capacity: {:.6} reserved: {} cost: {:.6} headroom: {standard:.6} needed: > {needed:.6}",
        record.capacity,
        record.reserved_count,
        unit_cost(record, config),
    );

    if config.overprovision {
        let over = overprovision_headroom(record, config);
        if over > needed {
            return Ok(ReservationKind::Overprovisioned);
        }
        reason.push_str(&format!(
            "; overprovision: {:.6} over_reserved: {} headroom: {over:.6}",
            record.overprovision, record.over_reserved_count,
        ));
    }

    Err(reason)
}

/// Raw score: standard headroom times the configured scale.
///
/// The float → int cast truncates toward zero and saturates at the `i64`
/// bounds; NaN scores as zero.
pub fn score(record: &HostRecord, config: &AdmissionConfig) -> i64 {
    (headroom(record, config) * config.score_scale) as i64
}

/// Linearly rescale raw scores into `[MIN_NODE_SCORE, MAX_NODE_SCORE]`.
///
/// The lowest raw score maps to the minimum and the highest to the maximum.
/// When every candidate ties, all collapse to the minimum.
pub fn normalize_scores(scores: &mut [NodeScore]) {
    let Some(highest) = scores.iter().map(|s| s.score).max() else {
        return;
    };
    let lowest = scores.iter().map(|s| s.score).min().unwrap_or(highest);

    let old_range = i128::from(highest) - i128::from(lowest);
    let new_range = i128::from(MAX_NODE_SCORE - MIN_NODE_SCORE);

    for entry in scores.iter_mut() {
        entry.score = if old_range == 0 {
            MIN_NODE_SCORE
        } else {
            let shifted = i128::from(entry.score) - i128::from(lowest);
            (shifted * new_range / old_range) as i64 + MIN_NODE_SCORE
        };
    }
}
