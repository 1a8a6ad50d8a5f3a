//! IngestSession — applies one agent's measurement stream to the ledger.
//!
//! A session binds to the node id carried by the first frame that names
//! one; later frames always update that node, whatever id they carry. When
//! the stream ends, for any reason, the last received values are written
//! once more and the ledger keeps them. There is no staleness marking: a
//! silent agent simply stops updating its node.

use std::net::SocketAddr;

use pronto_ledger::{HostLedger, HostUpdate, NodeId};
use tokio::sync::watch;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::proto;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The agent closed its side of the stream.
    Closed,
    /// The transport reported an error.
    Failed(String),
    /// The process is shutting down.
    Shutdown,
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub node: Option<NodeId>,
    pub frames_applied: u64,
    pub frames_dropped: u64,
    pub end: SessionEnd,
}

impl SessionSummary {
    fn log(&self, peer: Option<SocketAddr>) {
        let node = self.node.as_deref().unwrap_or("<unbound>");
        match &self.end {
            SessionEnd::Closed => info!(
                %node, ?peer, applied = self.frames_applied, dropped = self.frames_dropped,
                "telemetry agent disconnected gracefully"
            ),
            SessionEnd::Failed(reason) => warn!(
                %node, ?peer, applied = self.frames_applied, dropped = self.frames_dropped, %reason,
                "telemetry stream failed; keeping last known values"
            ),
            SessionEnd::Shutdown => info!(
                %node, ?peer, applied = self.frames_applied, dropped = self.frames_dropped,
                "telemetry session closed for shutdown"
            ),
        }
    }
}

/// Per-stream ingestion state.
#[derive(Debug)]
pub struct IngestSession {
    ledger: HostLedger,
    node: Option<NodeId>,
    last: Option<HostUpdate>,
    applied: u64,
    dropped: u64,
}

impl IngestSession {
    pub fn new(ledger: HostLedger) -> Self {
        Self {
            ledger,
            node: None,
            last: None,
            applied: 0,
            dropped: 0,
        }
    }

    /// Node this session is bound to, once a frame has named one.
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    /// Decode and apply one frame. Returns false if the frame was dropped.
    pub fn apply(&mut self, frame: &proto::Signal) -> bool {
        if self.node.is_none() {
            if frame.node.is_empty() {
                self.dropped += 1;
                warn!("telemetry frame before node identity; dropped");
                return false;
            }
            debug!(node = %frame.node, "telemetry session bound");
            self.node = Some(frame.node.clone());
        }
        let Some(node) = self.node.as_deref() else {
            return false;
        };

        if !frame.node.is_empty() && frame.node != node {
            debug!(%node, frame_node = %frame.node, "ignoring node id on later frame");
        }

        // Decode outside the ledger lock; the upsert itself is O(1).
        let update = HostUpdate::measurement(
            finite_or_default(node, "signal", frame.signal),
            finite_or_default(node, "capacity", frame.capacity),
            finite_or_default(node, "overprovision", frame.overprovision),
        );
        self.ledger.upsert(node, update);
        self.last = Some(update);
        self.applied += 1;
        true
    }

    /// Flush the last received values and summarize the session.
    pub fn finish(self, end: SessionEnd) -> SessionSummary {
        if let (Some(node), Some(update)) = (self.node.as_deref(), self.last) {
            self.ledger.upsert(node, update);
        }
        SessionSummary {
            node: self.node,
            frames_applied: self.applied,
            frames_dropped: self.dropped,
            end,
        }
    }
}

/// Drive a session until the stream ends or shutdown is signalled.
///
/// A frame that has been received is always applied in full before the
/// shutdown signal is checked again.
pub async fn run_session<S>(
    ledger: HostLedger,
    frames: S,
    mut shutdown: watch::Receiver<bool>,
    peer: Option<SocketAddr>,
) -> SessionSummary
where
    S: Stream<Item = Result<proto::Signal, tonic::Status>>,
{
    let mut frames = std::pin::pin!(frames);
    let mut session = IngestSession::new(ledger);

    let end = loop {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => break SessionEnd::Shutdown,
            frame = frames.next() => match frame {
                Some(Ok(frame)) => {
                    session.apply(&frame);
                }
                Some(Err(status)) => break SessionEnd::Failed(status.message().to_string()),
                None => break SessionEnd::Closed,
            },
        }
    };

    let summary = session.finish(end);
    summary.log(peer);
    summary
}

/// Resolves once `shutdown` holds `true` or its sender is gone.
///
/// Shared by every background loop that watches the process shutdown
/// channel.
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

fn finite_or_default(node: &str, field: &'static str, value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!(%node, field, %value, "non-finite telemetry value; using 0");
        0.0
    }
}
