#[cfg(feature = "lambda")]
use crate::core::snapshot::parse_table_rows;
#[cfg(feature = "lambda")]
use crate::core::{ConfigProvider, RawDataSource, Snapshot, Storage};
#[cfg(feature = "lambda")]
use crate::utils::error::{EtlError, Result};
#[cfg(feature = "lambda")]
use async_trait::async_trait;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use std::env;

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub ingestion_bucket: String,
    pub ingestion_prefix: String,
    pub processed_bucket: String,
    pub s3_region: String,
    pub lookup_path: String,
    pub output_formats: Vec<String>,
}

#[cfg(feature = "lambda")]
fn required_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| EtlError::MissingConfigError {
        field: name.to_string(),
    })
}

#[cfg(feature = "lambda")]
impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            ingestion_bucket: required_env("INGESTION_BUCKET")?,
            ingestion_prefix: env::var("INGESTION_PREFIX").unwrap_or_default(),
            processed_bucket: required_env("PROCESSED_BUCKET")?,
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "eu-west-2".to_string()),
            lookup_path: env::var("CURRENCY_LOOKUP_PATH")
                .unwrap_or_else(|_| "currencies_lookup.json".to_string()),
            output_formats: env::var("OUTPUT_FORMATS")
                .unwrap_or_else(|_| "csv".to_string())
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
        })
    }
}

#[cfg(feature = "lambda")]
impl ConfigProvider for LambdaConfig {
    fn snapshot_path(&self) -> &str {
        &self.ingestion_prefix
    }

    fn lookup_path(&self) -> &str {
        &self.lookup_path
    }

    fn output_path(&self) -> &str {
        &self.processed_bucket
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }
}

#[cfg(feature = "lambda")]
impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        // 驗證S3 bucket名稱
        validate_s3_bucket_name("INGESTION_BUCKET", &self.ingestion_bucket)?;
        validate_s3_bucket_name("PROCESSED_BUCKET", &self.processed_bucket)?;

        // 驗證區域
        validate_non_empty_string("S3_REGION", &self.s3_region)?;
        if !self
            .s3_region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(EtlError::InvalidConfigValueError {
                field: "S3_REGION".to_string(),
                value: self.s3_region.clone(),
                reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                    .to_string(),
            });
        }

        validate_path("CURRENCY_LOOKUP_PATH", &self.lookup_path)?;
        validate_output_formats("OUTPUT_FORMATS", &self.output_formats)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

#[cfg(feature = "lambda")]
impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[cfg(feature = "lambda")]
impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        read_object(&self.client, &self.bucket, path).await
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| EtlError::ProcessingError {
                message: format!(
                    "Failed to write s3://{}/{}: {}",
                    self.bucket,
                    path,
                    e.into_service_error()
                ),
            })?;

        tracing::debug!("Uploaded s3://{}/{}", self.bucket, path);
        Ok(())
    }
}

#[cfg(feature = "lambda")]
async fn read_object(client: &S3Client, bucket: &str, key: &str) -> Result<Vec<u8>> {
    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| EtlError::SourceUnavailable {
            message: format!(
                "Failed to read s3://{}/{}: {}",
                bucket,
                key,
                e.into_service_error()
            ),
        })?;

    let data = resp
        .body
        .collect()
        .await
        .map_err(|e| EtlError::SourceUnavailable {
            message: format!("Failed to collect s3://{}/{}: {}", bucket, key, e),
        })?;

    Ok(data.into_bytes().to_vec())
}

/// Snapshot assembled from the ingestion bucket. Objects live under
/// `<prefix>/<table>/...` and each holds one row object or an array of rows.
#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3SnapshotSource {
    client: S3Client,
    bucket: String,
    prefix: String,
}

#[cfg(feature = "lambda")]
impl S3SnapshotSource {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&self.prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| EtlError::SourceUnavailable {
                    message: format!(
                        "Failed to list s3://{}/{}: {}",
                        self.bucket,
                        self.prefix,
                        e.into_service_error()
                    ),
                })?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_string),
            );

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }
}

/// Table name of an ingestion object key, i.e. its first segment below the prefix.
#[cfg(any(feature = "lambda", test))]
pub fn table_of_key<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let relative = key.strip_prefix(prefix)?.trim_start_matches('/');
    let (table, rest) = relative.split_once('/')?;
    if table.is_empty() || rest.is_empty() {
        None
    } else {
        Some(table)
    }
}

#[cfg(feature = "lambda")]
#[async_trait]
impl RawDataSource for S3SnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let keys = self.list_keys().await?;
        tracing::info!(
            "Found {} ingestion objects under s3://{}/{}",
            keys.len(),
            self.bucket,
            self.prefix
        );

        let mut snapshot = Snapshot::new();
        for key in &keys {
            let Some(table) = table_of_key(&self.prefix, key) else {
                tracing::debug!("Skipping object outside a table folder: {}", key);
                continue;
            };
            let bytes = read_object(&self.client, &self.bucket, key).await?;
            snapshot.extend(table, parse_table_rows(table, &bytes)?);
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_of_key() {
        assert_eq!(table_of_key("", "staff/12/2025-02-26"), Some("staff"));
        assert_eq!(
            table_of_key("ingestion", "ingestion/address_all_data/3/2025-02-26"),
            Some("address_all_data")
        );
        assert_eq!(table_of_key("", "loose-file.json"), None);
        assert_eq!(table_of_key("other", "staff/1/x"), None);
    }
}
