//! rowstore-verify library
//!
//! Checks that a source and a target row store hold the same data, key by
//! key. The engine lives in the `row-verify` crate; this crate adds the
//! configuration file, store connection, key files, report files and the
//! command handlers used by the `rowstore-verify` binary.
//!
//! # CLI Usage
//!
//! ```bash
//! # Write a default configuration file
//! rowstore-verify init-config
//!
//! # Verify every source key against the target
//! rowstore-verify verify --source-dir ./snap/old --target-dir ./snap/new \
//!   --source-table orders --target-table orders --max-workers 20
//!
//! # Verify selected keys and save the report
//! rowstore-verify verify --rowkeys-file keys.txt --output report.json
//!
//! # Check both stores are reachable
//! rowstore-verify check
//! ```

use clap::Parser;
use std::path::PathBuf;

pub mod commands;
pub mod config;
pub mod connect;
pub mod keys;
pub mod output;

pub use config::Config;

#[derive(Parser, Clone, Debug, Default)]
pub struct SourceOpts {
    /// Source store host
    #[arg(long, env = "SOURCE_HOST")]
    pub source_host: Option<String>,

    /// Source store port
    #[arg(long, env = "SOURCE_PORT")]
    pub source_port: Option<u16>,

    /// Source table name
    #[arg(long, env = "SOURCE_TABLE")]
    pub source_table: Option<String>,

    /// Source snapshot directory
    #[arg(long, env = "SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug, Default)]
pub struct TargetOpts {
    /// Target store host
    #[arg(long, env = "TARGET_HOST")]
    pub target_host: Option<String>,

    /// Target store port
    #[arg(long, env = "TARGET_PORT")]
    pub target_port: Option<u16>,

    /// Target table name
    #[arg(long, env = "TARGET_TABLE")]
    pub target_table: Option<String>,

    /// Target snapshot directory
    #[arg(long, env = "TARGET_DIR")]
    pub target_dir: Option<PathBuf>,
}

impl From<&SourceOpts> for config::StoreOverrides {
    fn from(opts: &SourceOpts) -> Self {
        Self {
            host: opts.source_host.clone(),
            port: opts.source_port,
            table: opts.source_table.clone(),
            snapshot_dir: opts.source_dir.clone(),
        }
    }
}

impl From<&TargetOpts> for config::StoreOverrides {
    fn from(opts: &TargetOpts) -> Self {
        Self {
            host: opts.target_host.clone(),
            port: opts.target_port,
            table: opts.target_table.clone(),
            snapshot_dir: opts.target_dir.clone(),
        }
    }
}

impl Config {
    /// Apply connection flags for both sides.
    pub fn apply_store_opts(&mut self, source: &SourceOpts, target: &TargetOpts) {
        self.source.apply(&source.into());
        self.target.apply(&target.into());
    }
}
