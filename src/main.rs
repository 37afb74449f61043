//! Command-line interface for rowstore-verify
//!
//! # Usage Examples
//!
//! ## Verification
//! ```bash
//! # Scan every key of the source table
//! rowstore-verify verify \
//!   --source-dir ./snapshots/old --source-table ns:orders \
//!   --target-dir ./snapshots/new --target-table ns:orders
//!
//! # Verify the first 1000 source keys with 20 workers and save the report
//! rowstore-verify verify --max-rows 1000 --max-workers 20 --save-report
//!
//! # Verify keys listed in a file
//! rowstore-verify verify --rowkeys-file keys.txt --output report.json
//! ```
//!
//! ## Setup
//! ```bash
//! rowstore-verify init-config --path rowstore-verify.yaml
//! rowstore-verify check
//! ```
//!
//! ## Exit Status
//! - `0`: the run completed, whatever the comparison outcome
//! - `1`: configuration, connection or scan failure
//! - `130`: the run was interrupted

use clap::{Parser, Subcommand};
use rowstore_verify::commands::{run_check, run_init_config, run_verify};
use rowstore_verify::config::duration::parse_duration;
use rowstore_verify::config::{Config, DEFAULT_CONFIG_FILE};
use rowstore_verify::output::{format_summary, ProgressBar};
use rowstore_verify::{SourceOpts, TargetOpts};
use row_verify::{CancelHandle, VerifyArgs};
use std::path::PathBuf;
use std::time::Duration;

const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "rowstore-verify")]
#[command(about = "Verify that two row stores hold the same data")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(
        long,
        short = 'c',
        global = true,
        default_value = DEFAULT_CONFIG_FILE,
        env = "ROWSTORE_VERIFY_CONFIG"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare source and target rows
    Verify {
        #[command(flatten)]
        source: SourceOpts,

        #[command(flatten)]
        target: TargetOpts,

        #[command(flatten)]
        args: VerifyArgs,

        /// Per-lookup timeout, e.g. "500ms", "30s" (default: the larger store timeout)
        #[arg(long, value_parser = parse_duration)]
        fetch_timeout: Option<Duration>,

        /// Do not draw the progress bar
        #[arg(long)]
        quiet: bool,
    },

    /// Test that both stores can be opened
    Check {
        #[command(flatten)]
        source: SourceOpts,

        #[command(flatten)]
        target: TargetOpts,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Where to write the file (default: the --config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match run().await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config)?;
    let found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();

    // Initialize tracing, RUST_LOG wins over the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !found && !matches!(cli.command, Commands::InitConfig { .. }) {
        tracing::info!(
            "Config file {} not found, using defaults",
            cli.config.display()
        );
    }

    match cli.command {
        Commands::Verify {
            source,
            target,
            args,
            fetch_timeout,
            quiet,
        } => {
            config.apply_store_opts(&source, &target);
            config.apply_verify_args(&args);

            let cancel = CancelHandle::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, stopping verification");
                    on_interrupt.cancel();
                }
            });

            let bar = ProgressBar::default();
            let silent = row_verify::NoopProgress;
            let progress: &dyn row_verify::ProgressSink = if quiet { &silent } else { &bar };

            let outcome = run_verify(&config, &args, fetch_timeout, cancel, progress).await;
            if !quiet {
                bar.finish();
            }
            let outcome = outcome?;

            println!("{}", format_summary(&outcome.report));
            if let Some(path) = &outcome.report_path {
                println!("Report saved to {}", path.display());
            }

            Ok(if outcome.cancelled() { EXIT_INTERRUPTED } else { 0 })
        }
        Commands::Check { source, target } => {
            config.apply_store_opts(&source, &target);

            let statuses = run_check(&config).await?;
            let mut all_ok = true;
            for status in &statuses {
                let marker = if status.ok { "OK" } else { "FAILED" };
                println!(
                    "[{marker}] {} store {}: {}",
                    status.side, status.location, status.message
                );
                all_ok &= status.ok;
            }

            if !all_ok {
                anyhow::bail!("Connection test failed");
            }
            println!("Connection test passed");
            Ok(0)
        }
        Commands::InitConfig { path, force } => {
            let path = path.unwrap_or(cli.config);
            run_init_config(&path, force)?;
            println!("Configuration written to {}", path.display());
            Ok(0)
        }
    }
}
