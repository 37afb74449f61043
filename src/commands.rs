//! Command handlers.

use crate::config::Config;
use crate::connect::open_stores;
use crate::keys::load_rowkeys;
use crate::output::ReportWriter;
use anyhow::Context;
use row_verify::{CancelHandle, ProgressSink, Report, Verifier, VerifyArgs};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What a finished `verify` command produced.
#[derive(Debug)]
pub struct VerifyOutcome {
    pub report: Report,
    pub report_path: Option<PathBuf>,
}

impl VerifyOutcome {
    pub fn cancelled(&self) -> bool {
        self.report.cancelled
    }
}

/// Run a verification as configured.
///
/// Keys come from `args.rowkeys_file` when given, otherwise from a scan of
/// the source store capped by `validation.max_rows`.
pub async fn run_verify(
    config: &Config,
    args: &VerifyArgs,
    fetch_timeout: Option<Duration>,
    cancel: CancelHandle,
    progress: &dyn ProgressSink,
) -> anyhow::Result<VerifyOutcome> {
    config.validate()?;

    let (source, target) = open_stores(&config.source, &config.target).await?;
    let verifier = Verifier::new(source, target)
        .with_concurrency(config.validation.max_workers)
        .with_progress_interval(config.validation.progress_interval)
        .with_fetch_timeout(Some(fetch_timeout.unwrap_or_else(|| config.fetch_timeout())))
        .with_max_detail_records(config.report.max_detail_records)
        .with_drain_policy(config.validation.drain)
        .with_cancel_handle(cancel);

    tracing::info!(
        "Verifying {} against {} with {} workers",
        verifier.source(),
        verifier.target(),
        config.validation.max_workers
    );

    let result = match &args.rowkeys_file {
        Some(path) => {
            let keys = load_rowkeys(path).await?;
            verifier.verify_keys(&keys, progress).await?
        }
        None => {
            verifier
                .verify_all(config.validation.max_rows, progress)
                .await?
        }
    };

    let report = Report::assemble(&result, verifier.source(), verifier.target());

    let writer = ReportWriter::new(&config.report);
    let report_path = match (&args.output, args.save_report) {
        (Some(path), _) => Some(writer.write(&report, Some(path)).await?),
        (None, true) => Some(writer.write(&report, None).await?),
        (None, false) => None,
    };

    Ok(VerifyOutcome {
        report,
        report_path,
    })
}

/// Connection status of one store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStatus {
    pub side: row_verify::Side,
    pub location: String,
    pub ok: bool,
    pub message: String,
}

/// Open both stores and probe each with a one-key scan.
pub async fn run_check(config: &Config) -> anyhow::Result<Vec<StoreStatus>> {
    config.validate()?;
    let mut statuses = Vec::new();

    for (side, store_config) in [
        (row_verify::Side::Source, &config.source),
        (row_verify::Side::Target, &config.target),
    ] {
        let location = store_config.descriptor().to_string();
        let status = match crate::connect::open_store(side, store_config).await {
            Ok(store) => match store.list_keys(Some(1)).await {
                Ok(_) => StoreStatus {
                    side,
                    location,
                    ok: true,
                    message: "reachable".to_string(),
                },
                Err(e) => StoreStatus {
                    side,
                    location,
                    ok: false,
                    message: e.to_string(),
                },
            },
            Err(e) => StoreStatus {
                side,
                location,
                ok: false,
                message: e.to_string(),
            },
        };
        statuses.push(status);
    }

    Ok(statuses)
}

/// Write the default configuration to `path`.
pub fn run_init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        );
    }
    Config::default()
        .save(path)
        .with_context(|| format!("Failed to create config file {}", path.display()))?;
    tracing::info!("Default configuration written to {}", path.display());
    Ok(())
}
