//! JSONL snapshot-backed row store.

use crate::error::StoreError;
use crate::store::{RowStore, StoreDescriptor};
use async_trait::async_trait;
use row_types::{Row, RowKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// One line of a table snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub key: RowKey,
    #[serde(default)]
    pub columns: Row,
}

/// Read-only row store loaded from `<snapshot_dir>/<table>.jsonl`.
///
/// The whole table is loaded when the store is opened; lookups and scans
/// afterwards never touch the filesystem. When a key appears on several
/// lines the last one wins.
pub struct JsonlStore {
    descriptor: StoreDescriptor,
    path: PathBuf,
    rows: BTreeMap<RowKey, Row>,
}

impl JsonlStore {
    /// Open the table named in `descriptor` under `snapshot_dir`.
    ///
    /// Fails with [`StoreError::Unavailable`] if the directory does not
    /// exist and with [`StoreError::TableNotFound`] if the table file is
    /// missing.
    pub async fn open(
        snapshot_dir: impl AsRef<Path>,
        descriptor: StoreDescriptor,
    ) -> Result<Self, StoreError> {
        let dir = snapshot_dir.as_ref();
        if !tokio::fs::try_exists(dir).await? {
            return Err(StoreError::Unavailable {
                location: dir.display().to_string(),
                message: "snapshot directory does not exist".to_string(),
            });
        }

        let path = table_path(dir, &descriptor.table);
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::TableNotFound(descriptor.table.clone()));
        }

        tracing::info!("Loading snapshot table {} from {}", descriptor.table, path.display());

        let file = tokio::fs::File::open(&path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut rows = BTreeMap::new();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let parsed: SnapshotLine =
                serde_json::from_str(&line).map_err(|e| StoreError::Parse {
                    path: path.display().to_string(),
                    line: line_no,
                    message: e.to_string(),
                })?;
            rows.insert(parsed.key, parsed.columns);
        }

        tracing::debug!("Loaded {} rows from {}", rows.len(), path.display());

        Ok(Self {
            descriptor,
            path,
            rows,
        })
    }

    /// Write `rows` as the snapshot file for `table` under `snapshot_dir`.
    ///
    /// Creates the directory if needed and replaces any existing file.
    pub async fn write_table<I>(
        snapshot_dir: impl AsRef<Path>,
        table: &str,
        rows: I,
    ) -> Result<PathBuf, StoreError>
    where
        I: IntoIterator<Item = SnapshotLine>,
    {
        let dir = snapshot_dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let path = table_path(dir, table);
        let mut file = tokio::fs::File::create(&path).await?;
        for line in rows {
            let json = serde_json::to_string(&line).map_err(|e| StoreError::Parse {
                path: path.display().to_string(),
                line: 0,
                message: e.to_string(),
            })?;
            file.write_all(json.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }
        file.flush().await?;
        Ok(path)
    }

    /// Path of the loaded snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.jsonl"))
}

#[async_trait]
impl RowStore for JsonlStore {
    fn descriptor(&self) -> &StoreDescriptor {
        &self.descriptor
    }

    async fn get_row(&self, key: &RowKey) -> Result<Option<Row>, StoreError> {
        Ok(self.rows.get(key).cloned())
    }

    async fn list_keys(&self, limit: Option<usize>) -> Result<Vec<RowKey>, StoreError> {
        let keys = self.rows.keys().cloned();
        Ok(match limit {
            Some(n) => keys.take(n).collect(),
            None => keys.collect(),
        })
    }
}
