//! prontod — assembles the Pronto subsystems into one process.
//!
//! - `config` — `pronto.toml` parsing and validation
//! - `daemon` — engine construction, telemetry server, annotation poller,
//!   lifecycle adapter, periodic ledger summary, graceful shutdown

pub mod config;
pub mod daemon;

pub use config::ProntoConfig;
pub use daemon::Daemon;
