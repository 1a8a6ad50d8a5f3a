//! Telemetry gRPC server.
//!
//! Implements `SignalService/StreamSignals`. Each accepted stream becomes
//! one [`run_session`] task; the response stream carries no frames and is
//! closed when the session ends, with an `internal` status if the inbound
//! stream failed.

use std::net::SocketAddr;

use pronto_ledger::HostLedger;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info};

use crate::error::{TelemetryError, TelemetryResult};
use crate::proto;
use crate::proto::signal_service_server::{SignalService, SignalServiceServer};
use crate::session::{SessionEnd, run_session, shutdown_requested};

/// gRPC implementation of the signal service.
pub struct TelemetryServer {
    ledger: HostLedger,
    shutdown: watch::Receiver<bool>,
}

impl TelemetryServer {
    /// Create a server writing into `ledger`. Sessions end when `shutdown`
    /// turns true.
    pub fn new(ledger: HostLedger, shutdown: watch::Receiver<bool>) -> Self {
        Self { ledger, shutdown }
    }

    /// Get the tonic service for mounting on a gRPC server.
    pub fn into_service(self) -> SignalServiceServer<Self> {
        SignalServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl SignalService for TelemetryServer {
    type StreamSignalsStream = ReceiverStream<Result<proto::SignalAck, Status>>;

    async fn stream_signals(
        &self,
        request: Request<Streaming<proto::Signal>>,
    ) -> Result<Response<Self::StreamSignalsStream>, Status> {
        let peer = request.remote_addr();
        let frames = request.into_inner();
        let ledger = self.ledger.clone();
        let shutdown = self.shutdown.clone();

        // The sender lives as long as the session; dropping it closes the
        // response stream.
        let (tx, rx) = mpsc::channel(1);

        debug!(?peer, "telemetry stream opened");
        tokio::spawn(async move {
            let summary = run_session(ledger, frames, shutdown, peer).await;
            if let SessionEnd::Failed(reason) = summary.end {
                let _ = tx
                    .send(Err(Status::internal(format!("error receiving stream: {reason}"))))
                    .await;
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

/// Bind the telemetry listener. Failure here is fatal for the caller.
pub async fn bind(addr: SocketAddr) -> TelemetryResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| TelemetryError::Bind { addr, source })
}

/// Serve `SignalService` on `listener` until `shutdown` turns true.
///
/// On shutdown the server stops accepting streams and waits for open
/// sessions, which observe the same signal, to flush and close.
pub async fn serve(
    listener: TcpListener,
    ledger: HostLedger,
    shutdown: watch::Receiver<bool>,
) -> TelemetryResult<()> {
    let local_addr = listener.local_addr().ok();
    let service = TelemetryServer::new(ledger, shutdown.clone()).into_service();
    let mut signal = shutdown;

    info!(addr = ?local_addr, "telemetry server started");

    tonic::transport::Server::builder()
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            shutdown_requested(&mut signal).await;
            info!("shutting down telemetry server");
        })
        .await?;

    info!("telemetry server shutdown complete");
    Ok(())
}
