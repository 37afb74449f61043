//! Structured run events.

use crate::aggregate::OutcomeCounts;
use row_types::RowKey;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which store of the pair an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Target => f.write_str("target"),
        }
    }
}

/// Something noteworthy that happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyEvent {
    /// Key enumeration on the source store started.
    KeyScanStarted { limit: Option<usize> },
    /// The source store yielded no keys.
    NoKeys,
    RunStarted { keys: usize, concurrency: usize },
    /// A row lookup failed or timed out.
    FetchFailed {
        key: RowKey,
        side: Side,
        error: String,
    },
    /// A verification task panicked.
    TaskPanicked { key: Option<RowKey>, message: String },
    /// Cancellation was observed; `submitted` tasks had been started.
    Cancelled { submitted: usize, total: usize },
    RunFinished {
        counts: OutcomeCounts,
        elapsed: Duration,
        cancelled: bool,
    },
}

/// Receiver of run events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &VerifyEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &VerifyEvent) {
        match event {
            VerifyEvent::KeyScanStarted { limit } => match limit {
                Some(limit) => info!("Listing up to {limit} keys from source"),
                None => info!("Listing all keys from source"),
            },
            VerifyEvent::NoKeys => warn!("Source store returned no keys, nothing to verify"),
            VerifyEvent::RunStarted { keys, concurrency } => {
                info!(keys, concurrency, "Starting verification of {keys} keys")
            }
            VerifyEvent::FetchFailed { key, side, error } => {
                warn!(rowkey = %key, side = %side, "Row fetch failed: {error}")
            }
            VerifyEvent::TaskPanicked { key, message } => match key {
                Some(key) => warn!(rowkey = %key, "Verification task panicked: {message}"),
                None => warn!("Verification task panicked: {message}"),
            },
            VerifyEvent::Cancelled { submitted, total } => {
                warn!("Verification cancelled after submitting {submitted}/{total} keys")
            }
            VerifyEvent::RunFinished {
                counts,
                elapsed,
                cancelled,
            } => {
                info!(
                    "Verification {}: {} keys in {:?} - {} matched, {} missing in target, {} missing in source, {} mismatched, {} errors",
                    if *cancelled { "interrupted" } else { "complete" },
                    counts.total,
                    elapsed,
                    counts.matched,
                    counts.missing_in_target,
                    counts.missing_in_source,
                    counts.data_mismatch,
                    counts.error
                );
                debug!(both_missing = counts.both_missing(), "Run counters");
            }
        }
    }
}
