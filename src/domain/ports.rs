use crate::domain::model::{CurrencyLookup, Snapshot};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn snapshot_path(&self) -> &str;
    fn lookup_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
}

/// Supplies the raw tables for one transformation run.
#[async_trait]
pub trait RawDataSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Snapshot>;
}

/// Supplies the currency code to display name reference data.
pub trait LookupLoader: Send + Sync {
    fn load_lookup(&self) -> Result<CurrencyLookup>;
}

impl LookupLoader for CurrencyLookup {
    fn load_lookup(&self) -> Result<CurrencyLookup> {
        Ok(self.clone())
    }
}

#[async_trait]
impl RawDataSource for Snapshot {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        Ok(self.clone())
    }
}
