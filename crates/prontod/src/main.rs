//! prontod — the Pronto daemon.
//!
//! Runs the telemetry server and, optionally, the annotation poller in one
//! process, holding the node ledger the scheduler plugin decides against.
//!
//! # Usage
//!
//! ```text
//! prontod serve --config /etc/pronto/pronto.toml
//! prontod check-config --config /etc/pronto/pronto.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use prontod::{Daemon, ProntoConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prontod", about = "Pronto admission daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the telemetry server and background tasks until Ctrl-C.
    Serve {
        /// Path to pronto.toml. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override `telemetry.listen`.
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,
    },
    /// Parse and validate a config file, then print the effective config.
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            listen,
            log_json,
        } => {
            init_tracing(log_json);
            let mut config = match config {
                Some(path) => ProntoConfig::from_file(&path)?,
                None => ProntoConfig::default(),
            };
            if let Some(listen) = listen {
                config.telemetry.listen = listen;
            }
            config.validate()?;
            run_serve(config).await
        }
        Command::CheckConfig { config } => {
            let config = ProntoConfig::from_file(&config)?;
            config.validate()?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,prontod=debug,pronto=debug"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run_serve(config: ProntoConfig) -> anyhow::Result<()> {
    info!("Pronto daemon starting");

    let daemon = Daemon::start(config).await?;

    tokio::signal::ctrl_c().await?;
    daemon.shutdown().await
}
