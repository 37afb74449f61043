//! In-memory row store.

use crate::error::StoreError;
use crate::store::{RowStore, StoreDescriptor};
use async_trait::async_trait;
use row_types::{Row, RowKey};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory implementation of the RowStore trait.
///
/// Keys are kept in raw-byte order, which is also the `list_keys` order.
pub struct MemoryStore {
    descriptor: StoreDescriptor,
    rows: RwLock<BTreeMap<RowKey, Row>>,
}

impl MemoryStore {
    /// Create an empty store serving `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_descriptor(StoreDescriptor::new("memory", 0, table))
    }

    pub fn with_descriptor(descriptor: StoreDescriptor) -> Self {
        Self {
            descriptor,
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    /// Builder-style bulk insert.
    pub fn with_rows<K, I>(self, rows: I) -> Self
    where
        K: Into<RowKey>,
        I: IntoIterator<Item = (K, Row)>,
    {
        {
            let mut guard = self.rows.write().unwrap_or_else(|e| e.into_inner());
            for (key, row) in rows {
                guard.insert(key.into(), row);
            }
        }
        self
    }

    /// Insert or replace a row.
    pub fn insert(&self, key: impl Into<RowKey>, row: Row) {
        self.rows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), row);
    }

    /// Remove a row, returning it if present.
    pub fn remove(&self, key: &RowKey) -> Option<Row> {
        self.rows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    fn descriptor(&self) -> &StoreDescriptor {
        &self.descriptor
    }

    async fn get_row(&self, key: &RowKey) -> Result<Option<Row>, StoreError> {
        let guard = self.rows.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard.get(key).cloned())
    }

    async fn list_keys(&self, limit: Option<usize>) -> Result<Vec<RowKey>, StoreError> {
        let guard = self.rows.read().unwrap_or_else(|e| e.into_inner());
        let keys = guard.keys().cloned();
        Ok(match limit {
            Some(n) => keys.take(n).collect(),
            None => keys.collect(),
        })
    }
}
