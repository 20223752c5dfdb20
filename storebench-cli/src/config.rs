//! Configuration loading from storebench.toml
//!
//! StoreBench configuration can be specified in a `storebench.toml` file.
//! The configuration is automatically discovered by walking up from the current directory;
//! command-line flags override individual keys.

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use storebench_core::SamplerConfig;
use storebench_stats::ThroughputFormula;

/// File name looked up during discovery
pub const CONFIG_FILE_NAME: &str = "storebench.toml";

/// StoreBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreBenchConfig {
    /// Benchmark run configuration
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    /// Background sampler configuration
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Address book: instance id → `host:port`
    #[serde(default)]
    pub peers: BTreeMap<String, String>,
    /// Listener for inbound messages
    #[serde(default)]
    pub listen: ListenConfig,
}

/// Benchmark run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Operations per epoch
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Timed repetitions per workload
    #[serde(default = "default_epochs")]
    pub epochs: u32,
    /// Act as a secondary (apply load, report measurements) instead of a primary
    #[serde(default)]
    pub secondary_mode: bool,
    /// Disable every other enabled instance for the duration of a run
    #[serde(default)]
    pub isolated_run: bool,
    /// Pause between epochs (e.g., "30s")
    #[serde(default = "default_cooldown")]
    pub cooldown: String,
    /// Namespace and instance id of this benchmark instance
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Instance a secondary reports its measurements to
    #[serde(default = "default_namespace")]
    pub primary: String,
    /// Secondaries addressed by distributed workloads
    #[serde(default)]
    pub secondaries: Vec<String>,
    /// Report `iterations * timeStd / timeMean^2` as `actionsPerSecondStd`
    #[serde(default)]
    pub derived_throughput_std: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            epochs: default_epochs(),
            secondary_mode: false,
            isolated_run: false,
            cooldown: default_cooldown(),
            namespace: default_namespace(),
            primary: default_namespace(),
            secondaries: Vec::new(),
            derived_throughput_std: false,
        }
    }
}

fn default_iterations() -> u64 {
    10_000
}
fn default_epochs() -> u32 {
    5
}
fn default_cooldown() -> String {
    "30s".to_string()
}
fn default_namespace() -> String {
    "benchmark.0".to_string()
}

/// Background sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Resource sampling period
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Scheduler lag sampler target interval
    #[serde(default = "default_lag_interval")]
    pub lag_interval: String,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            lag_interval: default_lag_interval(),
        }
    }
}

fn default_interval() -> String {
    "100ms".to_string()
}
fn default_lag_interval() -> String {
    "50ms".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Directory the JSON run report is written to
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            directory: default_output_dir(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}
fn default_output_dir() -> String {
    "target/storebench".to_string()
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListenConfig {
    /// TCP address to accept messages on (e.g., "127.0.0.1:7700")
    #[serde(default)]
    pub address: Option<String>,
}

impl StoreBenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Find `storebench.toml` in `start` or any of its ancestors
    pub fn find_config_file(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Discover and load configuration by walking up from the current directory
    pub fn discover() -> anyhow::Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        match Self::find_config_file(&cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::load(path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Reject values the run cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.benchmark.iterations == 0 {
            bail!("benchmark.iterations must be greater than 0");
        }
        if self.benchmark.epochs == 0 {
            bail!("benchmark.epochs must be greater than 0");
        }
        if self.benchmark.namespace.trim().is_empty() {
            bail!("benchmark.namespace must not be empty");
        }
        self.cooldown()?;
        if self.sample_interval()?.is_zero() {
            bail!("sampling.interval must be greater than 0");
        }
        if self.lag_interval()?.is_zero() {
            bail!("sampling.lag_interval must be greater than 0");
        }
        self.output
            .format
            .parse::<storebench_report::OutputFormat>()
            .map_err(anyhow::Error::msg)?;
        self.peer_addresses()?;
        self.listen_address()?;
        Ok(())
    }

    /// Pause between epochs
    pub fn cooldown(&self) -> anyhow::Result<Duration> {
        Self::parse_duration(&self.benchmark.cooldown)
            .map(Duration::from_nanos)
            .context("benchmark.cooldown")
    }

    /// Resource sampling period
    pub fn sample_interval(&self) -> anyhow::Result<Duration> {
        Self::parse_duration(&self.sampling.interval)
            .map(Duration::from_nanos)
            .context("sampling.interval")
    }

    /// Lag sampler interval
    pub fn lag_interval(&self) -> anyhow::Result<Duration> {
        Self::parse_duration(&self.sampling.lag_interval)
            .map(Duration::from_nanos)
            .context("sampling.lag_interval")
    }

    /// Sampler settings for the current process
    pub fn sampler_config(&self) -> anyhow::Result<SamplerConfig> {
        Ok(SamplerConfig {
            interval: self.sample_interval()?,
            lag_interval: self.lag_interval()?,
            pid: std::process::id(),
        })
    }

    /// Formula used for `actionsPerSecondStd`
    pub fn throughput_formula(&self) -> ThroughputFormula {
        if self.benchmark.derived_throughput_std {
            ThroughputFormula::Derived
        } else {
            ThroughputFormula::Compatible
        }
    }

    /// Parsed `[peers]` table
    pub fn peer_addresses(&self) -> anyhow::Result<HashMap<String, SocketAddr>> {
        self.peers
            .iter()
            .map(|(id, addr)| {
                let parsed = addr
                    .parse()
                    .with_context(|| format!("peers.\"{}\": invalid address {}", id, addr))?;
                Ok((id.clone(), parsed))
            })
            .collect()
    }

    /// Parsed `[listen] address`
    pub fn listen_address(&self) -> anyhow::Result<Option<SocketAddr>> {
        self.listen
            .address
            .as_deref()
            .map(|addr| {
                addr.parse()
                    .with_context(|| format!("listen.address: invalid address {}", addr))
            })
            .transpose()
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# StoreBench Configuration

[benchmark]
# Operations per epoch
iterations = 10000
# Timed repetitions per workload
epochs = 5
# Pause between epochs
cooldown = "30s"
# Namespace (and instance id) of this benchmark instance
namespace = "benchmark.0"
# Run as a secondary: apply load and report measurements to `primary`
secondary_mode = false
primary = "benchmark.0"
# Secondaries used by distributed workloads
secondaries = []
# Disable every other enabled instance while running
isolated_run = false
# Report iterations * timeStd / timeMean^2 as actionsPerSecondStd
derived_throughput_std = false

[sampling]
# CPU/memory sampling period
interval = "100ms"
# Scheduler lag sampler interval
lag_interval = "50ms"

[output]
# Default output format: human, json
format = "human"
# Output directory for run reports
directory = "target/storebench"

[listen]
# TCP address to accept messages on (uncomment to enable)
# address = "127.0.0.1:7700"

[peers]
# Address book for other instances
# "benchmark.1" = "127.0.0.1:7701"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if value < 0.0 || !value.is_finite() {
            return Err(anyhow::anyhow!("Invalid duration: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}
