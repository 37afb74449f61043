//! Canonical row digests.

use row_types::Row;
use sha2::{Digest, Sha256};

/// Digest of an absent or column-less row.
pub const EMPTY_DIGEST: &str = "";

/// Compute the canonical digest of a row.
///
/// Columns are fed in raw-byte order of their identifiers, every field
/// prefixed with its length as a big-endian `u64`, so no two distinct
/// column maps share an input sequence. The result is lowercase hex
/// SHA-256. Absent and empty rows both map to [`EMPTY_DIGEST`].
pub fn digest(row: Option<&Row>) -> String {
    let row = match row {
        Some(row) if !row.is_empty() => row,
        _ => return EMPTY_DIGEST.to_string(),
    };

    let mut hasher = Sha256::new();
    for (column, value) in row {
        hasher.update((column.len() as u64).to_be_bytes());
        hasher.update(column);
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value);
    }
    format!("{:x}", hasher.finalize())
}
