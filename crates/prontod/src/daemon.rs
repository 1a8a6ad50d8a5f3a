//! Daemon wiring.
//!
//! Binding the telemetry listener is the only fatal startup step. Every
//! background task watches the same shutdown channel; [`Daemon::shutdown`]
//! flips it and waits for the telemetry server to drain its sessions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pronto_ledger::Engine;
use pronto_scheduler::{LifecycleEventAdapter, ProntoPlugin, WorkloadEvent};
use pronto_telemetry::{
    AnnotationPoller, FileNodeSource, NodeSource, TelemetryResult, shutdown_requested,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ProntoConfig;

/// Lifecycle notifications buffered before senders wait.
const EVENT_BUFFER: usize = 1024;

/// A running Pronto process.
pub struct Daemon {
    engine: Engine,
    plugin: ProntoPlugin,
    events: mpsc::Sender<WorkloadEvent>,
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    server: JoinHandle<TelemetryResult<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Daemon {
    /// Build the engine and start every subsystem.
    pub async fn start(config: ProntoConfig) -> anyhow::Result<Self> {
        let engine = Engine::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // ── Telemetry server ───────────────────────────────────────
        let listener = pronto_telemetry::bind(config.telemetry.listen).await?;
        let local_addr = listener.local_addr()?;
        let server = tokio::spawn(pronto_telemetry::serve(
            listener,
            engine.ledger().clone(),
            shutdown_rx.clone(),
        ));
        info!(addr = %local_addr, "telemetry listener bound");

        let mut tasks = Vec::new();

        // ── Annotation poller ──────────────────────────────────────
        if config.annotations.enabled {
            let source: Arc<dyn NodeSource> =
                Arc::new(FileNodeSource::new(config.annotations.path.clone()));
            let poller = AnnotationPoller::new(
                engine.ledger().clone(),
                source,
                Duration::from_secs(config.annotations.interval_secs),
            );
            info!(path = ?config.annotations.path, "annotation poller enabled");
            tasks.push(tokio::spawn(poller.run(shutdown_rx.clone())));
        }

        // ── Lifecycle adapter ──────────────────────────────────────
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let lifecycle = LifecycleEventAdapter::new(engine.reservations().clone());
        tasks.push(tokio::spawn(lifecycle.run(events_rx, shutdown_rx.clone())));

        // ── Ledger summary ─────────────────────────────────────────
        tasks.push(tokio::spawn(summary_loop(
            engine.clone(),
            Duration::from_secs(config.daemon.summary_interval_secs),
            shutdown_rx,
        )));

        let plugin = ProntoPlugin::new(engine.clone(), config.admission);
        info!(admission = ?plugin.decisions().config(), "pronto plugin ready");

        Ok(Self {
            engine,
            plugin,
            events: events_tx,
            local_addr,
            shutdown: shutdown_tx,
            server,
            tasks,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Extension points for the host scheduler.
    pub fn plugin(&self) -> &ProntoPlugin {
        &self.plugin
    }

    /// Feed for workload lifecycle notifications.
    pub fn events(&self) -> mpsc::Sender<WorkloadEvent> {
        self.events.clone()
    }

    /// Address the telemetry server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signal shutdown and wait for every subsystem to stop.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        info!("shutdown signal received");
        let _ = self.shutdown.send(true);

        self.server.await??;
        for task in self.tasks {
            let _ = task.await;
        }

        info!("Pronto daemon stopped");
        Ok(())
    }
}

/// Periodically log what the ledger currently holds.
async fn summary_loop(engine: Engine, every: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = interval.tick() => log_summary(&engine),
            _ = shutdown_requested(&mut shutdown) => break,
        }
    }
}

fn log_summary(engine: &Engine) {
    let snapshot = engine.ledger().snapshot();
    info!(
        nodes = snapshot.len(),
        reservations = engine.reservations().reservation_count(),
        "ledger summary"
    );
    for (node, record) in &snapshot {
        debug!(
            %node,
            signal = record.signal,
            capacity = record.capacity,
            overprovision = record.overprovision,
            pod_cost = record.pod_cost,
            reserved = record.reserved_count,
            over_reserved = record.over_reserved_count,
            "node"
        );
    }
}
