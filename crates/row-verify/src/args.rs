//! CLI argument definitions for verification runs.

use clap::Args;
use std::path::PathBuf;

/// Tuning flags shared by every verification command.
///
/// Unset flags fall back to the configuration file.
#[derive(Args, Clone, Debug, Default)]
pub struct VerifyArgs {
    /// File with one row key per line (default: scan all source keys)
    #[arg(long, short = 'k', env = "ROWSTORE_VERIFY_ROWKEYS_FILE")]
    pub rowkeys_file: Option<PathBuf>,

    /// Maximum number of source keys to verify when scanning
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Number of keys verified concurrently
    #[arg(long, short = 'w', env = "ROWSTORE_VERIFY_MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Report progress every N verified keys
    #[arg(long)]
    pub progress_interval: Option<usize>,

    /// Abort in-flight keys on interrupt instead of letting them finish
    #[arg(long)]
    pub abandon_on_cancel: bool,

    /// Write the JSON report to this path
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Write the JSON report to the configured output directory
    #[arg(long, conflicts_with = "output")]
    pub save_report: bool,

    /// Omit per-key details from the report
    #[arg(long)]
    pub no_details: bool,
}
