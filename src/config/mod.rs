//! YAML configuration file.
//!
//! ```yaml
//! source:
//!   host: localhost
//!   port: 9090
//!   table: orders
//!   timeout_ms: 30000
//!   snapshot_dir: ./snapshots/source
//! target:
//!   ...
//! validation:
//!   max_rows: 1000
//!   max_workers: 10
//!   progress_interval: 100
//!   drain: wait
//! report:
//!   output_dir: ./reports
//!   include_details: true
//!   max_detail_records: 1000
//! logging:
//!   level: info
//! ```
//!
//! Every field is optional in the file; missing fields take their defaults.

pub mod duration;

use anyhow::Context;
use row_store::StoreDescriptor;
use row_verify::{DrainPolicy, VerifyArgs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "rowstore-verify.yaml";

/// Complete tool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: StoreConfig,
    pub target: StoreConfig,
    pub validation: ValidationConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: StoreConfig::for_side("source"),
            target: StoreConfig::for_side("target"),
            validation: ValidationConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Where one side's table lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub table: String,
    /// Per-lookup timeout in milliseconds.
    pub timeout_ms: u64,
    /// Root directory of the JSONL snapshot store.
    pub snapshot_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9090,
            table: String::new(),
            timeout_ms: 30_000,
            snapshot_dir: PathBuf::from("./snapshots"),
        }
    }
}

impl StoreConfig {
    fn for_side(side: &str) -> Self {
        Self {
            table: format!("{side}_table"),
            snapshot_dir: PathBuf::from(format!("./snapshots/{side}")),
            ..Self::default()
        }
    }

    pub fn descriptor(&self) -> StoreDescriptor {
        StoreDescriptor::new(self.host.clone(), self.port, self.table.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Apply command-line overrides.
    pub fn apply(&mut self, overrides: &StoreOverrides) {
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(table) = &overrides.table {
            self.table = table.clone();
        }
        if let Some(dir) = &overrides.snapshot_dir {
            self.snapshot_dir = dir.clone();
        }
    }
}

/// Command-line values that replace [`StoreConfig`] fields when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub table: Option<String>,
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Cap on the number of keys taken from a source scan.
    pub max_rows: Option<usize>,
    pub max_workers: usize,
    pub progress_interval: usize,
    pub drain: DrainPolicy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_rows: None,
            max_workers: row_verify::verifier::DEFAULT_CONCURRENCY,
            progress_interval: row_verify::verifier::DEFAULT_PROGRESS_INTERVAL,
            drain: DrainPolicy::Wait,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub include_details: bool,
    pub max_detail_records: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./reports"),
            include_details: true,
            max_detail_records: row_verify::verifier::DEFAULT_MAX_DETAIL_RECORDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from YAML.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse configuration YAML")
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration")
    }

    /// Load configuration from `path`.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
            .map(Some)
    }

    /// Write configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        std::fs::write(path, self.to_yaml()?)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Apply verification flags from the command line.
    pub fn apply_verify_args(&mut self, args: &VerifyArgs) {
        if let Some(max_rows) = args.max_rows {
            self.validation.max_rows = Some(max_rows);
        }
        if let Some(workers) = args.max_workers {
            self.validation.max_workers = workers;
        }
        if let Some(interval) = args.progress_interval {
            self.validation.progress_interval = interval;
        }
        if args.abandon_on_cancel {
            self.validation.drain = DrainPolicy::Abandon;
        }
        if args.no_details {
            self.report.include_details = false;
        }
    }

    /// Per-lookup timeout used for both stores.
    pub fn fetch_timeout(&self) -> Duration {
        self.source.timeout().max(self.target.timeout())
    }

    /// Reject settings a run cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source.table.trim().is_empty() {
            anyhow::bail!("source table name must not be empty");
        }
        if self.target.table.trim().is_empty() {
            anyhow::bail!("target table name must not be empty");
        }
        if self.validation.max_workers == 0 {
            anyhow::bail!("validation.max_workers must be at least 1");
        }
        if self.validation.progress_interval == 0 {
            anyhow::bail!("validation.progress_interval must be at least 1");
        }
        Ok(())
    }
}
