//! Report files and terminal summary.

use crate::config::ReportConfig;
use anyhow::Context;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use row_verify::{ProgressSink, Report, Verdict};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::path::{Path, PathBuf};

/// Writes reports as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    include_details: bool,
}

impl ReportWriter {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            include_details: config.include_details,
        }
    }

    /// `<output_dir>/validation_report_<unix_ts>.json`
    pub fn default_path(&self) -> PathBuf {
        let ts = chrono::Utc::now().timestamp();
        self.output_dir.join(format!("validation_report_{ts}.json"))
    }

    /// Write `report` to `path`, or to [`Self::default_path`] if none is given.
    pub async fn write(&self, report: &Report, path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let path = path.map_or_else(|| self.default_path(), Path::to_path_buf);

        let serialized = if self.include_details {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string_pretty(&report.clone().without_details())
        };
        let json = serialized.context("Failed to serialize report")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        tracing::info!("Report written to {}", path.display());
        Ok(path)
    }
}

/// Render the summary table and verdict.
pub fn format_summary(report: &Report) -> String {
    let s = &report.summary;
    let mut output = String::new();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Outcome", "Rows"]);
    table.add_row(vec![Cell::new("Total"), Cell::new(format_number(s.total))]);
    table.add_row(vec![
        Cell::new("Matched").fg(Color::Green),
        Cell::new(format_number(s.matched)),
    ]);
    table.add_row(vec![
        Cell::new("Missing in target"),
        Cell::new(format_number(s.missing_in_target)),
    ]);
    table.add_row(vec![
        Cell::new("Missing in source"),
        Cell::new(format_number(s.missing_in_source)),
    ]);
    table.add_row(vec![
        Cell::new("Data mismatch"),
        Cell::new(format_number(s.data_mismatch)),
    ]);
    table.add_row(vec![
        Cell::new("Error").fg(Color::Red),
        Cell::new(format_number(s.error)),
    ]);
    if s.both_missing > 0 {
        table.add_row(vec![
            Cell::new("Missing in both"),
            Cell::new(format_number(s.both_missing)),
        ]);
    }

    output.push_str(&table.to_string());
    output.push('\n');
    output.push_str(&format!(
        "Success rate: {:.2}%  Time: {:.2}s  ({:.1} rows/sec)\n",
        s.success_rate,
        s.validation_time,
        report.rows_per_second()
    ));
    if report.cancelled {
        output.push_str("Run was interrupted; counts cover the verified rows only\n");
    }
    if report.details_truncated > 0 {
        output.push_str(&format!(
            "{} detail records omitted from the report\n",
            format_number(report.details_truncated)
        ));
    }

    let verdict = report.verdict();
    let marker = match verdict {
        Verdict::Identical => "OK",
        Verdict::MostlyConsistent | Verdict::NotableDifferences => "WARN",
        Verdict::LargeDifferences => "FAIL",
    };
    output.push_str(&format!("[{marker}] {}\n", verdict.description()));
    output
}

/// Format a number with thousands separators.
fn format_number(n: u64) -> String {
    let digits = n.to_string().into_bytes();
    let mut grouped = Vec::with_capacity(digits.len() + digits.len() / 3);

    for (i, digit) in digits.iter().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(b',');
        }
        grouped.push(*digit);
    }
    grouped.reverse();

    String::from_utf8_lossy(&grouped).into_owned()
}

/// Text progress bar on stderr.
///
/// The bar redraws in place. Call [`ProgressBar::finish`] once the run is
/// over so later output starts on a fresh line.
#[derive(Debug)]
pub struct ProgressBar {
    width: usize,
    open: AtomicBool,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::with_width(50)
    }
}

impl ProgressBar {
    pub fn with_width(width: usize) -> Self {
        Self {
            width,
            open: AtomicBool::new(false),
        }
    }

    pub fn render(&self, completed: usize, total: usize) -> String {
        let ratio = if total == 0 {
            1.0
        } else {
            (completed as f64 / total as f64).min(1.0)
        };
        let filled = (ratio * self.width as f64).round() as usize;
        format!(
            "[{}{}] {completed}/{total} ({:.1}%)",
            "#".repeat(filled),
            "-".repeat(self.width - filled),
            ratio * 100.0
        )
    }

    /// Terminate the bar line if one is still open.
    pub fn finish(&self) {
        let mut stderr = std::io::stderr().lock();
        let _ = self.finish_to(&mut stderr);
        let _ = stderr.flush();
    }

    fn draw_to(
        &self,
        out: &mut impl Write,
        completed: usize,
        total: usize,
    ) -> std::io::Result<()> {
        write!(out, "\r{}", self.render(completed, total))?;
        if completed >= total {
            writeln!(out)?;
            self.open.store(false, Ordering::SeqCst);
        } else {
            self.open.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn finish_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        if self.open.swap(false, Ordering::SeqCst) {
            writeln!(out)?;
        }
        Ok(())
    }
}

impl ProgressSink for ProgressBar {
    fn on_progress(&self, completed: usize, total: usize) {
        let mut stderr = std::io::stderr().lock();
        let _ = self.draw_to(&mut stderr, completed, total);
        let _ = stderr.flush();
    }
}
