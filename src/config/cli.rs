use crate::core::snapshot::{parse_snapshot_document, parse_table_rows};
use crate::core::{RawDataSource, Snapshot, Storage};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

/// Reads a snapshot from disk: either one JSON document mapping table names
/// to rows, or a directory holding one `<table>.json` per table.
#[derive(Debug, Clone)]
pub struct LocalSnapshotSource {
    path: PathBuf,
}

impl LocalSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_directory(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();
        let mut entries = tokio::fs::read_dir(&self.path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(table) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let bytes = tokio::fs::read(&path).await?;
            let rows = parse_table_rows(table, &bytes)?;
            tracing::debug!("Read {} rows for '{}' from {}", rows.len(), table, path.display());
            snapshot.insert(table, rows);
        }

        Ok(snapshot)
    }
}

#[async_trait]
impl RawDataSource for LocalSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| EtlError::SourceUnavailable {
                message: format!("cannot access '{}': {}", self.path.display(), e),
            })?;

        if metadata.is_dir() {
            self.read_directory().await
        } else {
            let bytes = tokio::fs::read(&self.path).await?;
            parse_snapshot_document(&bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_round_trip_creates_directories() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());

        storage
            .write_file("dim_design/20240101000000.csv", b"design_id\n1\n")
            .await
            .unwrap();
        let data = storage
            .read_file("dim_design/20240101000000.csv")
            .await
            .unwrap();
        assert_eq!(data, b"design_id\n1\n");
    }

    #[tokio::test]
    async fn test_snapshot_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("design.json"),
            json!([{"design_id": 1}, {"design_id": 2}]).to_string(),
        )
        .unwrap();
        std::fs::write(dir.path().join("staff.json"), json!({"staff_id": 7}).to_string()).unwrap();
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let snapshot = LocalSnapshotSource::new(dir.path())
            .fetch_snapshot()
            .await
            .unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.table("design").unwrap().len(), 2);
        assert_eq!(snapshot.table("staff").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_from_single_document() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("snapshot.json");
        std::fs::write(&file, json!({"currency": [{"currency_id": 1}]}).to_string()).unwrap();

        let snapshot = LocalSnapshotSource::new(&file).fetch_snapshot().await.unwrap();
        assert_eq!(snapshot.table("currency").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_path_is_source_unavailable() {
        let err = LocalSnapshotSource::new("/no/such/snapshot")
            .fetch_snapshot()
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::SourceUnavailable { .. }));
    }
}
