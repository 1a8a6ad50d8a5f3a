//! Admission policy configuration.
//!
//! One formula covers both accounting models:
//!
//! ```text
//! headroom = capacity - reserved_count * unit_cost
//! admit    ⇔ headroom > threshold
//! ```
//!
//! `unit_cost` is 1 under the count model and the node's declared pod cost
//! under the scalar-cost model. With overprovisioning enabled, a node that
//! fails the standard check is tried again against
//! `overprovision - over_reserved_count * unit_cost`.

use serde::{Deserialize, Serialize};

use crate::error::{DecisionError, DecisionResult};

/// Minimum headroom a node must exceed to be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Threshold {
    /// Fixed epsilon shared by all nodes.
    Fixed(f64),
    /// The node's own declared pod cost.
    PodCost,
}

/// What a single reservation consumes from a node's headroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostModel {
    /// Each reservation costs exactly one unit of capacity.
    Unit,
    /// Each reservation costs the node's declared pod cost.
    Declared,
}

/// Tunable admission policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    pub threshold: Threshold,
    pub cost_model: CostModel,
    /// Allow placement against the secondary overprovision headroom.
    pub overprovision: bool,
    /// Multiplier from headroom to raw score.
    pub score_scale: f64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::Fixed(0.1),
            cost_model: CostModel::Unit,
            overprovision: false,
            score_scale: 100.0,
        }
    }
}

impl AdmissionConfig {
    /// Reject values that would make every comparison meaningless.
    pub fn validate(&self) -> DecisionResult<()> {
        if let Threshold::Fixed(epsilon) = self.threshold {
            if !epsilon.is_finite() || epsilon < 0.0 {
                return Err(DecisionError::InvalidPolicy(format!(
                    "threshold must be a finite, non-negative number (got {epsilon})"
                )));
            }
        }
        if !self.score_scale.is_finite() || self.score_scale <= 0.0 {
            return Err(DecisionError::InvalidPolicy(format!(
                "score_scale must be a finite, positive number (got {})",
                self.score_scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        AdmissionConfig::default().validate().unwrap();
    }

    #[test]
    fn negative_threshold_rejected() {
        let config = AdmissionConfig {
            threshold: Threshold::Fixed(-1.0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DecisionError::InvalidPolicy(_))));
    }

    #[test]
    fn zero_scale_rejected() {
        let config = AdmissionConfig {
            score_scale: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_fixed_threshold() {
        let config: AdmissionConfig = toml::from_str(
            r#"
threshold = { fixed = 0.25 }
cost_model = "declared"
"#,
        )
        .unwrap();
        assert_eq!(config.threshold, Threshold::Fixed(0.25));
        assert_eq!(config.cost_model, CostModel::Declared);
        assert!(!config.overprovision);
        assert_eq!(config.score_scale, 100.0);
    }

    #[test]
    fn parse_pod_cost_threshold() {
        let config: AdmissionConfig = toml::from_str(
            r#"
threshold = "pod-cost"
overprovision = true
"#,
        )
        .unwrap();
        assert_eq!(config.threshold, Threshold::PodCost);
        assert_eq!(config.cost_model, CostModel::Unit);
        assert!(config.overprovision);
    }
}
