//! pronto.toml configuration parser.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use pronto_placement::AdmissionConfig;
use serde::{Deserialize, Serialize};

/// Default telemetry listen address.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:50051";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProntoConfig {
    pub telemetry: TelemetryConfig,
    pub admission: AdmissionConfig,
    pub annotations: AnnotationsConfig,
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub listen: SocketAddr,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 50051)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationsConfig {
    pub enabled: bool,
    /// JSON node listing re-read on every poll.
    pub path: PathBuf,
    pub interval_secs: u64,
}

impl Default for AnnotationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("/etc/pronto/nodes.json"),
            interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub summary_interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            summary_interval_secs: 60,
        }
    }
}

impl ProntoConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ProntoConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.admission.validate()?;
        if self.annotations.interval_secs == 0 {
            bail!("annotations.interval_secs must be at least 1");
        }
        if self.daemon.summary_interval_secs == 0 {
            bail!("daemon.summary_interval_secs must be at least 1");
        }
        Ok(())
    }
}
