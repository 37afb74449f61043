//! Error types for row store operations.

use thiserror::Error;

/// Errors that can occur while talking to a row store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Table does not exist in the store.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// The store could not be reached.
    #[error("Store unavailable at {location}: {message}")]
    Unavailable { location: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot content could not be parsed.
    #[error("Failed to parse {path} line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    /// Point lookup failed.
    #[error("Fetch failed for key '{key}': {message}")]
    Fetch { key: String, message: String },

    /// Key scan failed.
    #[error("Scan failed: {0}")]
    Scan(String),
}
