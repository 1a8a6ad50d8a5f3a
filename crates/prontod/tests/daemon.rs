//! Daemon integration tests.
//!
//! Starts the whole process in-memory on 127.0.0.1:0 and drives it through
//! the telemetry stream, the annotation file, the plugin surface and the
//! lifecycle feed.

use std::io::Write;
use std::time::Duration;

use pronto_scheduler::{CycleState, FilterPlugin, NodeInfo, Pod, PodPhase, ReservePlugin, WorkloadEvent};
use pronto_telemetry::proto::Signal;
use pronto_telemetry::proto::signal_service_client::SignalServiceClient;
use prontod::{Daemon, ProntoConfig};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

fn test_config() -> ProntoConfig {
    let mut config = ProntoConfig::default();
    config.telemetry.listen = "127.0.0.1:0".parse().unwrap();
    config
}

async fn wait_for<F: Fn() -> bool>(check: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn telemetry_reserve_and_release() {
    let daemon = Daemon::start(test_config()).await.unwrap();
    let engine = daemon.engine().clone();

    let mut client = SignalServiceClient::connect(format!("http://{}", daemon.local_addr()))
        .await
        .unwrap();
    let (tx, rx) = mpsc::channel(8);
    tx.send(Signal {
        node: "nodeA".to_string(),
        signal: 1.0,
        capacity: 1.0,
        overprovision: 0.0,
    })
    .await
    .unwrap();
    let _acks = client.stream_signals(ReceiverStream::new(rx)).await.unwrap();

    wait_for(|| engine.ledger().contains("nodeA")).await;

    let plugin = daemon.plugin();
    let state = CycleState::new();
    let pod = Pod::new("pod1");
    assert!(plugin.filter(&state, &pod, &NodeInfo::new("nodeA")).is_success());
    assert!(plugin.reserve(&state, &pod, "nodeA").is_success());
    assert_eq!(engine.ledger().get("nodeA").unwrap().reserved_count, 1);

    // nodeA is full until pod1 is observed running.
    assert!(!plugin
        .filter(&CycleState::new(), &Pod::new("pod2"), &NodeInfo::new("nodeA"))
        .is_success());

    daemon
        .events()
        .send(WorkloadEvent::Updated {
            workload: "pod1".to_string(),
            node: "nodeA".to_string(),
            old_phase: PodPhase::Pending,
            new_phase: PodPhase::Running,
        })
        .await
        .unwrap();
    wait_for(|| engine.ledger().get("nodeA").is_some_and(|r| r.reserved_count == 0)).await;

    // The agent is still connected; shutdown must not hang on it.
    tokio::time::timeout(Duration::from_secs(5), daemon.shutdown())
        .await
        .expect("daemon did not stop")
        .unwrap();
    drop(tx);
}

#[tokio::test]
async fn annotations_feed_the_ledger() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"name": "nodeX", "annotations": {{"pronto/signal": "3.0", "pronto/pod-cost": "0.5"}}}}]"#
    )
    .unwrap();

    let mut config = test_config();
    config.annotations.enabled = true;
    config.annotations.path = file.path().to_path_buf();
    config.annotations.interval_secs = 1;

    let daemon = Daemon::start(config).await.unwrap();
    let engine = daemon.engine().clone();

    wait_for(|| engine.ledger().contains("nodeX")).await;
    let record = engine.ledger().get("nodeX").unwrap();
    assert_eq!(record.signal, 3.0);
    assert_eq!(record.capacity, 3.0);
    assert_eq!(record.pod_cost, 0.5);

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn bind_failure_is_fatal() {
    let first = Daemon::start(test_config()).await.unwrap();

    let mut config = test_config();
    config.telemetry.listen = first.local_addr();
    assert!(Daemon::start(config).await.is_err());

    first.shutdown().await.unwrap();
}
