//! Telemetry error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while serving or polling telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to bind telemetry listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("node source error: {0}")]
    Source(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
