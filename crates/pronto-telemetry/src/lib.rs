//! pronto-telemetry — feeds live node measurements into the Pronto ledger.
//!
//! Two pluggable sources write into the same `HostLedger`:
//!
//! ```text
//! node agent ──gRPC StreamSignals──► TelemetryServer ──► IngestSession ──┐
//!                                                                       ├─► HostLedger::upsert
//! NodeSource (annotations) ──poll──► AnnotationPoller ──────────────────┘
//! ```
//!
//! The streaming source is push-based: one long-lived session per agent,
//! bound to the node named in its first frame. The annotation source is
//! poll-based, for nodes that have no agent.

pub mod annotations;
pub mod error;
pub mod server;
pub mod session;

/// Wire messages and generated gRPC service stubs.
///
/// ```text
/// package pronto.telemetry.v1;
///
/// service SignalService {
///   rpc StreamSignals(stream Signal) returns (stream SignalAck);
/// }
/// ```
pub mod proto {
    /// One measurement frame sent by a node agent.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Signal {
        /// Node the session is bound to. Only read from the first frame.
        #[prost(string, tag = "1")]
        pub node: ::prost::alloc::string::String,
        #[prost(double, tag = "2")]
        pub signal: f64,
        #[prost(double, tag = "3")]
        pub capacity: f64,
        #[prost(double, tag = "4")]
        pub overprovision: f64,
    }

    /// Reserved for server-to-agent frames; never sent today.
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct SignalAck {}

    include!(concat!(env!("OUT_DIR"), "/pronto.telemetry.v1.SignalService.rs"));
}

pub use annotations::{
    AnnotationPoller, FileNodeSource, NodeObject, NodeSource, PollReport, StaticNodeSource,
};
pub use error::{TelemetryError, TelemetryResult};
pub use server::{TelemetryServer, bind, serve};
pub use session::{IngestSession, SessionEnd, SessionSummary, run_session, shutdown_requested};
