//! Runtime configuration.
//!
//! Loaded from a TOML file (`$PULSEBAND_CONFIG`, or `config.toml` under the
//! platform config dir), then overridden from the environment. AWS
//! credentials are only ever taken from the environment.

use crate::shadow::Credentials;
use crate::skill::{ConvergenceWait, REQUEST_DEADLINE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Region used when neither the config nor the endpoint names one.
const FALLBACK_REGION: &str = "us-east-1";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub shadow: ShadowConfig,
    pub heartbeat: HeartbeatConfig,
    pub gateway: GatewayConfig,
}

/// `[shadow]`: device shadow service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Data-plane endpoint, e.g. `https://xxxx-ats.iot.us-east-2.amazonaws.com`.
    pub endpoint: String,
    /// Signing region. Derived from the endpoint host when unset.
    pub region: Option<String>,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: None,
            timeout_secs: 10,
            credentials: None,
        }
    }
}

impl ShadowConfig {
    /// Configured region, else the one embedded in `*.iot.<region>.amazonaws.com`.
    pub fn resolved_region(&self) -> String {
        if let Some(region) = self.region.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            return region.to_string();
        }
        region_from_endpoint(&self.endpoint).unwrap_or_else(|| FALLBACK_REGION.to_string())
    }
}

fn region_from_endpoint(endpoint: &str) -> Option<String> {
    let host = reqwest::Url::parse(endpoint).ok()?.host_str()?.to_string();
    let labels: Vec<&str> = host.split('.').collect();
    let iot = labels.iter().position(|label| *label == "iot")?;
    labels
        .get(iot + 1)
        .filter(|region| !region.is_empty() && **region != "amazonaws")
        .map(|region| (*region).to_string())
}

/// How the heartbeat workflow waits for the band to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitMode {
    /// One unconditional delay, then one read.
    #[default]
    Fixed,
    /// Delay, then up to `max_polls` reads until a pulse shows up.
    Poll,
}

/// `[heartbeat]`: convergence wait for on-demand pulse readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    pub mode: WaitMode,
    pub wait_ms: u64,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            mode: WaitMode::Fixed,
            wait_ms: 3000,
            poll_interval_ms: 1000,
            max_polls: 3,
        }
    }
}

impl HeartbeatConfig {
    pub fn convergence_wait(&self) -> ConvergenceWait {
        let initial = Duration::from_millis(self.wait_ms);
        match self.mode {
            WaitMode::Fixed => ConvergenceWait::Fixed(initial),
            WaitMode::Poll => ConvergenceWait::Poll {
                initial,
                interval: Duration::from_millis(self.poll_interval_ms),
                max_polls: self.max_polls,
            },
        }
    }
}

/// `[gateway]`: HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl Config {
    /// Load config from `path`, `$PULSEBAND_CONFIG`, or the default location.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("PULSEBAND_CONFIG").map(PathBuf::from))
            .or_else(default_config_path);

        let mut config = match path {
            Some(ref p) if p.exists() => Self::from_file(p)?,
            Some(ref p) => {
                tracing::debug!("No config file at {}, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without applying overrides.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("PULSEBAND_SHADOW_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            self.shadow.endpoint = endpoint.trim().to_string();
        }
        if let Some(region) = lookup("AWS_REGION").filter(|v| !v.trim().is_empty()) {
            self.shadow.region = Some(region.trim().to_string());
        }
        self.shadow.credentials = Credentials::from_lookup(&lookup);
    }

    /// Reject values the workflows cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let endpoint = self.shadow.endpoint.trim();
        if !endpoint.is_empty() && !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            anyhow::bail!("shadow.endpoint must start with http:// or https:// (got '{endpoint}')");
        }
        if self.shadow.timeout_secs == 0 {
            anyhow::bail!("shadow.timeout_secs must be greater than zero");
        }
        if self.heartbeat.mode == WaitMode::Poll && self.heartbeat.max_polls == 0 {
            anyhow::bail!("heartbeat.max_polls must be at least 1 when heartbeat.mode = \"poll\"");
        }
        let sleep = self.heartbeat.convergence_wait().max_sleep();
        if sleep >= REQUEST_DEADLINE {
            anyhow::bail!(
                "heartbeat waits add up to {} ms, which leaves no time for the shadow calls within the {} s request deadline",
                sleep.as_millis(),
                REQUEST_DEADLINE.as_secs()
            );
        }
        Ok(())
    }
}

/// `<config dir>/pulseband/config.toml`, when a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pulseband")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
