//! Error types for verification runs.

use crate::events::Side;
use row_store::StoreError;
use thiserror::Error;

/// Errors that abort a verification run.
///
/// Failures tied to a single key never surface here; they are recorded
/// as `error` outcomes in the run result.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// A store could not be opened before the run started.
    #[error("Failed to connect to {side} store {location}: {source}")]
    Connection {
        side: Side,
        location: String,
        #[source]
        source: StoreError,
    },

    /// Key enumeration on the source store failed.
    #[error("Failed to list source keys: {0}")]
    Scan(#[source] StoreError),

    /// Invalid run settings.
    #[error("Configuration error: {0}")]
    Config(String),
}
