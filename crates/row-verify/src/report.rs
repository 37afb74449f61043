//! Verification report document.

use crate::aggregate::{DetailRecord, ValidationResult};
use chrono::{DateTime, Utc};
use row_store::StoreDescriptor;
use serde::Serialize;

/// Counter summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: u64,
    pub matched: u64,
    pub missing_in_target: u64,
    pub missing_in_source: u64,
    pub data_mismatch: u64,
    pub error: u64,
    /// Keys absent from both stores; counted in `total` only.
    pub both_missing: u64,
    /// Percentage of matched keys.
    pub success_rate: f64,
    /// Run duration in seconds.
    pub validation_time: f64,
}

/// Which tables were compared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    pub source: StoreDescriptor,
    pub target: StoreDescriptor,
}

/// Immutable report of one verification run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub configuration: Configuration,
    pub details: Vec<DetailRecord>,
    /// When the report was assembled.
    pub timestamp: DateTime<Utc>,
    /// The run was interrupted before all keys were verified.
    pub cancelled: bool,
    /// Detail records not kept because the log was full.
    pub details_truncated: u64,
}

/// Overall judgement of a run, derived from its success rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Identical,
    MostlyConsistent,
    NotableDifferences,
    LargeDifferences,
}

impl Verdict {
    pub fn from_success_rate(rate: f64) -> Self {
        if rate >= 100.0 {
            Verdict::Identical
        } else if rate >= 95.0 {
            Verdict::MostlyConsistent
        } else if rate >= 80.0 {
            Verdict::NotableDifferences
        } else {
            Verdict::LargeDifferences
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Verdict::Identical => "Source and target data are identical",
            Verdict::MostlyConsistent => "Data is mostly consistent, a few rows differ",
            Verdict::NotableDifferences => "Data has notable differences, check the details",
            Verdict::LargeDifferences => "Data has large differences, investigate immediately",
        }
    }
}

impl Report {
    /// Assemble a report from a finished run.
    pub fn assemble(
        result: &ValidationResult,
        source: &StoreDescriptor,
        target: &StoreDescriptor,
    ) -> Self {
        let counts = &result.counts;
        Self {
            summary: Summary {
                total: counts.total,
                matched: counts.matched,
                missing_in_target: counts.missing_in_target,
                missing_in_source: counts.missing_in_source,
                data_mismatch: counts.data_mismatch,
                error: counts.error,
                both_missing: counts.both_missing(),
                success_rate: counts.success_rate(),
                validation_time: result.elapsed.as_secs_f64(),
            },
            configuration: Configuration {
                source: source.clone(),
                target: target.clone(),
            },
            details: result.details.clone(),
            timestamp: Utc::now(),
            cancelled: result.cancelled,
            details_truncated: result.dropped_details,
        }
    }

    /// Drop the detail log, keeping the summary.
    pub fn without_details(mut self) -> Self {
        self.details_truncated += self.details.len() as u64;
        self.details.clear();
        self
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_success_rate(self.summary.success_rate)
    }

    /// Verified keys per second.
    pub fn rows_per_second(&self) -> f64 {
        if self.summary.validation_time > 0.0 {
            self.summary.total as f64 / self.summary.validation_time
        } else {
            0.0
        }
    }
}
