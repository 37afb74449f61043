//! Row store trait and shared types.

use crate::error::StoreError;
use async_trait::async_trait;
use row_types::{Row, RowKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the table a store serves.
///
/// Only addressing information lives here, never credentials, so the
/// descriptor can be echoed into reports and logs as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDescriptor {
    pub host: String,
    pub port: u16,
    pub table: String,
}

impl StoreDescriptor {
    pub fn new(host: impl Into<String>, port: u16, table: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            table: table.into(),
        }
    }
}

impl fmt::Display for StoreDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.table)
    }
}

/// Read access to one table of a key-value row store.
///
/// Implementations are shared across all verification workers of a run,
/// so they must tolerate concurrent reads.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Where this store points.
    fn descriptor(&self) -> &StoreDescriptor;

    /// Fetch the row stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist. An existing row with no
    /// columns is returned as `Ok(Some(Row::new()))`.
    async fn get_row(&self, key: &RowKey) -> Result<Option<Row>, StoreError>;

    /// List keys in store order, at most `limit` of them if given.
    async fn list_keys(&self, limit: Option<usize>) -> Result<Vec<RowKey>, StoreError>;
}
