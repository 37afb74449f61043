//! Thread-safe accumulation of per-key outcomes.

use crate::compare::{DiffDetail, Outcome};
use chrono::{DateTime, Utc};
use row_types::RowKey;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Outcome counters of a run.
///
/// `both_missing` keys only count towards `total`; see
/// [`OutcomeCounts::both_missing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub total: u64,
    pub matched: u64,
    pub missing_in_target: u64,
    pub missing_in_source: u64,
    pub data_mismatch: u64,
    pub error: u64,
}

impl OutcomeCounts {
    fn apply(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Matched => self.matched += 1,
            Outcome::MissingInTarget => self.missing_in_target += 1,
            Outcome::MissingInSource => self.missing_in_source += 1,
            Outcome::DataMismatch => self.data_mismatch += 1,
            Outcome::Error => self.error += 1,
            Outcome::BothMissing => {}
        }
    }

    /// Keys that were absent from both stores.
    pub fn both_missing(&self) -> u64 {
        self.total
            - (self.matched
                + self.missing_in_target
                + self.missing_in_source
                + self.data_mismatch
                + self.error)
    }

    /// Percentage of matched keys, `0.0` for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64 * 100.0
        }
    }
}

/// Outcome-specific payload of a detail record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordDetails {
    Matched {
        message: String,
        columns_count: usize,
        data_hash: String,
    },
    MissingInSource {
        message: String,
        target_columns: usize,
    },
    MissingInTarget {
        message: String,
        source_columns: usize,
    },
    DataMismatch {
        message: String,
        source_hash: String,
        target_hash: String,
        mismatches: DiffDetail,
    },
    /// Both-missing and error records carry only a message.
    Message { message: String },
}

impl RecordDetails {
    pub fn message(&self) -> &str {
        match self {
            RecordDetails::Matched { message, .. }
            | RecordDetails::MissingInSource { message, .. }
            | RecordDetails::MissingInTarget { message, .. }
            | RecordDetails::DataMismatch { message, .. }
            | RecordDetails::Message { message } => message,
        }
    }
}

/// One entry of the detail log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRecord {
    pub rowkey: RowKey,
    pub status: Outcome,
    pub details: RecordDetails,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct AggregateState {
    counts: OutcomeCounts,
    details: Vec<DetailRecord>,
    dropped_details: u64,
}

/// Run-scoped accumulator shared by all verification tasks.
///
/// Every mutation happens under one mutex, so counters and the detail log
/// always agree with each other.
#[derive(Debug)]
pub struct ValidationAggregate {
    state: Mutex<AggregateState>,
    max_details: usize,
}

impl ValidationAggregate {
    /// Create an empty aggregate keeping at most `max_details` records.
    pub fn new(max_details: usize) -> Self {
        Self {
            state: Mutex::new(AggregateState::default()),
            max_details,
        }
    }

    /// Record the outcome of one key.
    ///
    /// Counters are always updated. The detail record is kept only while
    /// the log is below its cap; beyond that it is counted as dropped.
    pub fn record(&self, rowkey: RowKey, status: Outcome, details: RecordDetails) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.counts.apply(status);
        if state.details.len() < self.max_details {
            state.details.push(DetailRecord {
                rowkey,
                status,
                details,
                timestamp: Utc::now(),
            });
        } else {
            state.dropped_details += 1;
        }
    }

    /// Snapshot of the counters so far.
    pub fn counts(&self) -> OutcomeCounts {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .counts
    }

    /// Freeze the accumulated state into a result.
    ///
    /// Leaves the aggregate empty.
    pub fn finish(&self, elapsed: Duration, cancelled: bool) -> ValidationResult {
        let state = std::mem::take(&mut *self.state.lock().unwrap_or_else(PoisonError::into_inner));
        ValidationResult {
            counts: state.counts,
            elapsed,
            details: state.details,
            dropped_details: state.dropped_details,
            cancelled,
        }
    }
}

/// Immutable result of a finished (or cancelled) run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub counts: OutcomeCounts,
    pub elapsed: Duration,
    pub details: Vec<DetailRecord>,
    /// Records not kept because the detail log was full.
    pub dropped_details: u64,
    pub cancelled: bool,
}

impl ValidationResult {
    pub fn total(&self) -> u64 {
        self.counts.total
    }

    pub fn success_rate(&self) -> f64 {
        self.counts.success_rate()
    }

    pub fn both_missing(&self) -> u64 {
        self.counts.both_missing()
    }

    /// True when every processed key matched.
    pub fn is_consistent(&self) -> bool {
        self.counts.total > 0 && self.counts.matched == self.counts.total
    }
}
