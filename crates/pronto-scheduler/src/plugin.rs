//! The Pronto plugin: filter, score, normalize, reserve and unreserve over
//! one shared [`DecisionAdapter`].

use pronto_ledger::{Engine, ReserveEffect};
use pronto_placement::{AdmissionConfig, DecisionAdapter, DecisionError, NodeScore, normalize_scores};
use tracing::{debug, error, warn};

use crate::error::SchedulerError;
use crate::framework::{
    CycleState, FilterPlugin, NodeInfo, Plugin, Pod, ReservePlugin, ScoreExtensions, ScorePlugin,
    Status,
};

/// Name the plugin registers under.
pub const NAME: &str = "Pronto";

/// Admission plugin backed by the node ledger.
#[derive(Debug, Clone)]
pub struct ProntoPlugin {
    decisions: DecisionAdapter,
}

impl ProntoPlugin {
    pub fn new(engine: Engine, config: AdmissionConfig) -> Self {
        Self {
            decisions: DecisionAdapter::new(engine, config),
        }
    }

    pub fn decisions(&self) -> &DecisionAdapter {
        &self.decisions
    }
}

impl From<SchedulerError> for Status {
    fn from(err: SchedulerError) -> Self {
        Status::Error(err.to_string())
    }
}

impl Plugin for ProntoPlugin {
    fn name(&self) -> &'static str {
        NAME
    }
}

impl FilterPlugin for ProntoPlugin {
    fn filter(&self, state: &CycleState, pod: &Pod, node: &NodeInfo) -> Status {
        let Some(node) = node.node.as_deref() else {
            return Status::Error("node not found".to_string());
        };

        match self.decisions.filter(node) {
            Ok(admission) => {
                debug!(pod = %pod.name, %node, kind = ?admission.kind(), "node admitted");
                state.record(admission);
                Status::Success
            }
            Err(rejection) => {
                debug!(pod = %pod.name, %node, reason = %rejection, "node rejected");
                Status::Unschedulable(rejection.reason)
            }
        }
    }
}

impl ScorePlugin for ProntoPlugin {
    fn score(&self, _state: &CycleState, _pod: &Pod, node: &str) -> Result<i64, Status> {
        self.decisions
            .score(node)
            .map_err(|e| Status::Error(format!("getting node {node:?} from ledger: {e}")))
    }

    fn score_extensions(&self) -> Option<&dyn ScoreExtensions> {
        Some(self)
    }
}

impl ScoreExtensions for ProntoPlugin {
    fn normalize_score(&self, _state: &CycleState, _pod: &Pod, scores: &mut [NodeScore]) -> Status {
        normalize_scores(scores);
        Status::Success
    }
}

impl ReservePlugin for ProntoPlugin {
    fn reserve(&self, state: &CycleState, pod: &Pod, node: &str) -> Status {
        let Some(admission) = state.admission(node) else {
            let err = SchedulerError::MissingAdmission {
                node: node.to_string(),
            };
            error!(pod = %pod.name, %node, "reserve without a filter admission; not reserving");
            return err.into();
        };

        match self.decisions.commit(&pod.name, &admission) {
            Ok(ReserveEffect::AlreadyHeld(held)) if held.node == node => {
                debug!(pod = %pod.name, %node, kind = ?held.kind, "reserve retried; reservation already held");
                Status::Success
            }
            Ok(ReserveEffect::AlreadyHeld(held)) => {
                warn!(pod = %pod.name, %node, held_on = %held.node, "pod still holds a reservation on another node; not reserving");
                SchedulerError::HeldElsewhere {
                    workload: pod.name.clone(),
                    node: node.to_string(),
                    held_on: held.node,
                }
                .into()
            }
            Ok(_) => Status::Success,
            Err(err @ DecisionError::NodeNotFound(_)) => {
                warn!(pod = %pod.name, %node, "node left the ledger before reserve");
                SchedulerError::from(err).into()
            }
            Err(err) => SchedulerError::from(err).into(),
        }
    }

    fn unreserve(&self, _state: &CycleState, pod: &Pod, node: &str) {
        self.decisions.abort(&pod.name, node);
    }
}

#[cfg(test)]
mod tests {
    use pronto_ledger::{HostUpdate, ReservationKind};

    use super::*;

    fn plugin() -> ProntoPlugin {
        ProntoPlugin::new(Engine::new(), AdmissionConfig::default())
    }

    #[test]
    fn filter_missing_node_object_is_error() {
        let plugin = plugin();
        let status = plugin.filter(&CycleState::new(), &Pod::new("pod1"), &NodeInfo::missing());
        assert_eq!(status, Status::Error("node not found".to_string()));
    }

    #[test]
    fn filter_unknown_node_is_unschedulable() {
        let plugin = plugin();
        let status = plugin.filter(&CycleState::new(), &Pod::new("pod1"), &NodeInfo::new("ghost"));
        assert_eq!(status, Status::Unschedulable("node not found".to_string()));
    }

    #[test]
    fn filter_then_reserve_counts_once() {
        let plugin = plugin();
        let engine = plugin.decisions().engine().clone();
        engine.ledger().upsert("nodeA", HostUpdate::measurement(1.0, 5.0, 0.0));

        let state = CycleState::new();
        let pod = Pod::new("pod1");
        assert!(plugin.filter(&state, &pod, &NodeInfo::new("nodeA")).is_success());
        assert!(plugin.reserve(&state, &pod, "nodeA").is_success());
        // A retried reserve does not count twice.
        assert!(plugin.reserve(&state, &pod, "nodeA").is_success());

        assert_eq!(engine.ledger().get("nodeA").unwrap().reserved_count, 1);
        assert_eq!(engine.reservations().is_reserved("pod1"), Some(ReservationKind::Standard));
    }

    #[test]
    fn reserve_on_second_node_while_held_is_error() {
        let plugin = plugin();
        let engine = plugin.decisions().engine().clone();
        engine.ledger().upsert("nodeA", HostUpdate::measurement(1.0, 5.0, 0.0));
        engine.ledger().upsert("nodeB", HostUpdate::measurement(1.0, 5.0, 0.0));
        let pod = Pod::new("pod1");

        let first = CycleState::new();
        assert!(plugin.filter(&first, &pod, &NodeInfo::new("nodeA")).is_success());
        assert!(plugin.reserve(&first, &pod, "nodeA").is_success());

        let second = CycleState::new();
        assert!(plugin.filter(&second, &pod, &NodeInfo::new("nodeB")).is_success());
        let status = plugin.reserve(&second, &pod, "nodeB");

        assert!(matches!(status, Status::Error(reason) if reason.contains("nodeA")));
        assert_eq!(engine.ledger().get("nodeA").unwrap().reserved_count, 1);
        assert_eq!(engine.ledger().get("nodeB").unwrap().reserved_count, 0);

        // Once the host unreserves the old placement, the new one goes through.
        plugin.unreserve(&first, &pod, "nodeA");
        assert!(plugin.reserve(&second, &pod, "nodeB").is_success());
        assert_eq!(engine.ledger().get("nodeA").unwrap().reserved_count, 0);
        assert_eq!(engine.ledger().get("nodeB").unwrap().reserved_count, 1);
    }

    #[test]
    fn reserve_without_filter_is_error() {
        let plugin = plugin();
        let engine = plugin.decisions().engine().clone();
        engine.ledger().upsert("nodeA", HostUpdate::measurement(1.0, 5.0, 0.0));

        let status = plugin.reserve(&CycleState::new(), &Pod::new("pod1"), "nodeA");

        assert!(matches!(status, Status::Error(_)));
        assert_eq!(engine.ledger().get("nodeA").unwrap().reserved_count, 0);
    }

    #[test]
    fn reserve_after_node_removed_is_error() {
        let plugin = plugin();
        let engine = plugin.decisions().engine().clone();
        engine.ledger().upsert("nodeA", HostUpdate::measurement(1.0, 5.0, 0.0));

        let state = CycleState::new();
        let pod = Pod::new("pod1");
        plugin.filter(&state, &pod, &NodeInfo::new("nodeA"));
        engine.ledger().remove("nodeA");

        let status = plugin.reserve(&state, &pod, "nodeA");
        assert!(matches!(status, Status::Error(reason) if reason.contains("nodeA")));
        assert!(!engine.ledger().contains("nodeA"));
    }

    #[test]
    fn unreserve_releases_overprovisioned_reservation() {
        let plugin = ProntoPlugin::new(
            Engine::new(),
            AdmissionConfig {
                overprovision: true,
                ..Default::default()
            },
        );
        let engine = plugin.decisions().engine().clone();
        engine.ledger().upsert("nodeA", HostUpdate::measurement(0.0, 0.0, 2.0));

        let state = CycleState::new();
        let pod = Pod::new("pod1");
        assert!(plugin.filter(&state, &pod, &NodeInfo::new("nodeA")).is_success());
        assert!(plugin.reserve(&state, &pod, "nodeA").is_success());
        assert_eq!(engine.ledger().get("nodeA").unwrap().over_reserved_count, 1);

        plugin.unreserve(&state, &pod, "nodeA");
        let record = engine.ledger().get("nodeA").unwrap();
        assert_eq!(record.over_reserved_count, 0);
        assert_eq!(record.reserved_count, 0);
    }

    #[test]
    fn score_and_normalize() {
        let plugin = plugin();
        let engine = plugin.decisions().engine().clone();
        engine.ledger().upsert("nodeA", HostUpdate::measurement(0.0, 1.0, 0.0));
        engine.ledger().upsert("nodeB", HostUpdate::measurement(0.0, 3.0, 0.0));

        let state = CycleState::new();
        let pod = Pod::new("pod1");
        let mut scores: Vec<NodeScore> = ["nodeA", "nodeB"]
            .iter()
            .map(|node| NodeScore {
                node: node.to_string(),
                score: plugin.score(&state, &pod, node).unwrap(),
            })
            .collect();
        assert_eq!(scores[0].score, 100);
        assert_eq!(scores[1].score, 300);

        let extensions = plugin.score_extensions().unwrap();
        assert!(extensions.normalize_score(&state, &pod, &mut scores).is_success());
        assert_eq!(scores[0].score, 0);
        assert_eq!(scores[1].score, 100);
    }

    #[test]
    fn score_unknown_node_is_error() {
        let plugin = plugin();
        let status = plugin
            .score(&CycleState::new(), &Pod::new("pod1"), "ghost")
            .unwrap_err();
        assert!(matches!(status, Status::Error(reason) if reason.contains("ghost")));
    }
}
