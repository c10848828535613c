use crate::core::orchestrator::TransformationOrchestrator;
use crate::domain::model::{OutputSet, Table};
use crate::domain::ports::{LookupLoader, RawDataSource, Storage};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub const SUPPORTED: [&'static str; 2] = ["csv", "json"];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }

    pub fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        match self {
            OutputFormat::Csv => table.to_csv(),
            OutputFormat::Json => table.to_json(),
        }
    }

    pub fn parse_list(formats: &[String]) -> Result<Vec<OutputFormat>> {
        formats.iter().map(|f| f.parse()).collect()
    }
}

impl FromStr for OutputFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(EtlError::InvalidConfigValueError {
                field: "output_formats".to_string(),
                value: other.to_string(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    OutputFormat::SUPPORTED.join(", ")
                ),
            }),
        }
    }
}

/// Object key for one encoded table of a run.
pub fn output_key(table: &str, run_started: &DateTime<Utc>, format: OutputFormat) -> String {
    format!(
        "{}/{}.{}",
        table,
        run_started.format("%Y%m%d%H%M%S"),
        format.extension()
    )
}

/// Transform, then hand every table to storage in each configured format.
pub struct EtlEngine<S: RawDataSource, L: LookupLoader, St: Storage> {
    orchestrator: TransformationOrchestrator<S, L>,
    storage: St,
    formats: Vec<OutputFormat>,
}

impl<S: RawDataSource, L: LookupLoader, St: Storage> EtlEngine<S, L, St> {
    pub fn new(
        orchestrator: TransformationOrchestrator<S, L>,
        storage: St,
        formats: Vec<OutputFormat>,
    ) -> Self {
        Self {
            orchestrator,
            storage,
            formats,
        }
    }

    /// Runs the whole pipeline and returns the keys written.
    pub async fn run(&self) -> Result<Vec<String>> {
        let run_started = Utc::now();
        tracing::info!("Starting ETL process...");

        let output = self.orchestrator.run().await?;
        self.load(&output, &run_started).await
    }

    pub async fn load(&self, output: &OutputSet, run_started: &DateTime<Utc>) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for (name, table) in output.iter() {
            for format in &self.formats {
                let key = output_key(name.as_str(), run_started, *format);
                let data = format.encode(table)?;
                tracing::debug!("Writing {} ({} bytes, {} rows)", key, data.len(), table.len());
                self.storage.write_file(&key, &data).await?;
                written.push(key);
            }
        }

        tracing::info!("📁 Wrote {} files for {} tables", written.len(), output.len());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CurrencyLookup, Snapshot};
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn design_only_snapshot() -> Snapshot {
        serde_json::from_value(json!({
            "design": [
                {"design_id": 1, "design_name": "Wooden", "created_at": "x", "last_updated": "y"},
                {"design_id": 2, "design_name": "Steel", "created_at": "x", "last_updated": "y"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!(" json ".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("parquet".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_key_layout() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            output_key("dim_design", &ts, OutputFormat::Csv),
            "dim_design/20240102030405.csv"
        );
    }

    #[tokio::test]
    async fn test_run_writes_each_successful_table_per_format() {
        let storage = MockStorage::new();
        let orchestrator =
            TransformationOrchestrator::new(design_only_snapshot(), CurrencyLookup::new());
        let engine = EtlEngine::new(
            orchestrator,
            storage.clone(),
            vec![OutputFormat::Csv, OutputFormat::Json],
        );

        let written = engine.run().await.unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[0].starts_with("dim_design/") && written[0].ends_with(".csv"));
        assert!(written[1].ends_with(".json"));

        let csv = storage.get_file(&written[0]).await.unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert_eq!(csv, "design_id,design_name\n1,Wooden\n2,Steel\n");

        let stored = storage.read_file(&written[1]).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&stored).unwrap();
        assert_eq!(parsed[1]["design_name"], json!("Steel"));
    }
}
