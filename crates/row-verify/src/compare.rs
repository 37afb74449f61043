//! Row classification.

use crate::digest::digest;
use row_types::encoding::{as_text, as_text_seq};
use row_types::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of comparing the source and target versions of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Both rows present with identical content.
    Matched,
    /// Present in target only.
    MissingInSource,
    /// Present in source only.
    MissingInTarget,
    /// Absent from both stores.
    BothMissing,
    /// Both rows present, content differs.
    DataMismatch,
    /// Lookup failed, timed out or the comparison panicked.
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Matched => "matched",
            Outcome::MissingInSource => "missing_in_source",
            Outcome::MissingInTarget => "missing_in_target",
            Outcome::BothMissing => "both_missing",
            Outcome::DataMismatch => "data_mismatch",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shared column whose value differs between source and target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDifference {
    #[serde(with = "as_text")]
    pub column: Vec<u8>,
    #[serde(with = "as_text")]
    pub source_value: Vec<u8>,
    #[serde(with = "as_text")]
    pub target_value: Vec<u8>,
}

/// Column-level difference between two present rows.
///
/// All lists are ordered by raw column bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffDetail {
    /// Columns present in source but not in target.
    #[serde(rename = "missing_columns_in_target", with = "as_text_seq")]
    pub only_in_source: Vec<Vec<u8>>,
    /// Columns present in target but not in source.
    #[serde(rename = "missing_columns_in_source", with = "as_text_seq")]
    pub only_in_target: Vec<Vec<u8>>,
    pub value_differences: Vec<ValueDifference>,
}

impl DiffDetail {
    /// Compute the column diff of two rows.
    pub fn between(source: &Row, target: &Row) -> Self {
        let mut detail = DiffDetail::default();

        for (column, source_value) in source {
            match target.get(column) {
                None => detail.only_in_source.push(column.to_vec()),
                Some(target_value) if target_value != source_value => {
                    detail.value_differences.push(ValueDifference {
                        column: column.to_vec(),
                        source_value: source_value.to_vec(),
                        target_value: target_value.to_vec(),
                    })
                }
                Some(_) => {}
            }
        }

        detail.only_in_target = target
            .column_names()
            .filter(|column| !source.contains_column(column))
            .map(<[u8]>::to_vec)
            .collect();

        detail
    }

    pub fn is_empty(&self) -> bool {
        self.only_in_source.is_empty()
            && self.only_in_target.is_empty()
            && self.value_differences.is_empty()
    }
}

/// Classification of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub outcome: Outcome,
    /// Present only for [`Outcome::DataMismatch`].
    pub diff: Option<DiffDetail>,
    /// Digests, computed only when both rows are present.
    pub digests: Option<(String, String)>,
}

/// Decide the outcome for a pair of optional rows.
///
/// Pure and infallible. The same pair always yields the same result.
pub fn classify(source: Option<&Row>, target: Option<&Row>) -> Classification {
    let (source, target) = match (source, target) {
        (None, None) => return Classification::bare(Outcome::BothMissing),
        (None, Some(_)) => return Classification::bare(Outcome::MissingInSource),
        (Some(_), None) => return Classification::bare(Outcome::MissingInTarget),
        (Some(source), Some(target)) => (source, target),
    };

    let source_digest = digest(Some(source));
    let target_digest = digest(Some(target));

    if source_digest == target_digest {
        Classification {
            outcome: Outcome::Matched,
            diff: None,
            digests: Some((source_digest, target_digest)),
        }
    } else {
        Classification {
            outcome: Outcome::DataMismatch,
            diff: Some(DiffDetail::between(source, target)),
            digests: Some((source_digest, target_digest)),
        }
    }
}

impl Classification {
    fn bare(outcome: Outcome) -> Self {
        Self {
            outcome,
            diff: None,
            digests: None,
        }
    }
}
