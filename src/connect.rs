use crate::config::StoreConfig;
use row_store::{JsonlStore, RowStore};
use row_verify::{Side, VerifyError};
use std::sync::Arc;

// Open the snapshot store configured for one side of the comparison
pub async fn open_store(
    side: Side,
    config: &StoreConfig,
) -> Result<Arc<dyn RowStore>, VerifyError> {
    let descriptor = config.descriptor();
    tracing::info!(
        "Opening {side} store {descriptor} from {}",
        config.snapshot_dir.display()
    );

    let store = JsonlStore::open(&config.snapshot_dir, descriptor.clone())
        .await
        .map_err(|source| VerifyError::Connection {
            side,
            location: descriptor.to_string(),
            source,
        })?;

    tracing::debug!("{side} store holds {} rows", store.len());
    Ok(Arc::new(store))
}

/// Open both stores, source first.
pub async fn open_stores(
    source: &StoreConfig,
    target: &StoreConfig,
) -> Result<(Arc<dyn RowStore>, Arc<dyn RowStore>), VerifyError> {
    let source = open_store(Side::Source, source).await?;
    let target = open_store(Side::Target, target).await?;
    Ok((source, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use row_store::SnapshotLine;
    use tempfile::TempDir;

    fn config(dir: &std::path::Path, table: &str) -> StoreConfig {
        StoreConfig {
            table: table.to_string(),
            snapshot_dir: dir.to_path_buf(),
            ..StoreConfig::default()
        }
    }

    #[tokio::test]
    async fn test_open_store() {
        let tmp = TempDir::new().unwrap();
        JsonlStore::write_table(
            tmp.path(),
            "orders",
            vec![SnapshotLine {
                key: "r1".into(),
                columns: [("c", "v")].into_iter().collect(),
            }],
        )
        .await
        .unwrap();

        let store = open_store(Side::Source, &config(tmp.path(), "orders"))
            .await
            .unwrap();
        assert_eq!(store.descriptor().table, "orders");
        assert_eq!(store.descriptor().port, 9090);
        assert!(store.get_row(&"r1".into()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_table_is_connection_error() {
        let tmp = TempDir::new().unwrap();
        let err = open_store(Side::Target, &config(tmp.path(), "nope"))
            .await
            .err()
            .unwrap();

        match &err {
            VerifyError::Connection { side, .. } => assert_eq!(*side, Side::Target),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("target"));
    }
}
