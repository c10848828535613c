#[cfg(feature = "cli")]
pub mod cli;
pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "warehouse-etl")]
#[command(about = "Transforms an ingestion snapshot into star-schema warehouse tables")]
pub struct CliConfig {
    /// Snapshot JSON file, or a directory of <table>.json files
    #[arg(long, default_value = "./data/snapshot")]
    pub snapshot_path: String,

    #[arg(long, default_value = "./data/currencies_lookup.json")]
    pub lookup_path: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "csv")]
    pub output_formats: Vec<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn snapshot_path(&self) -> &str {
        &self.snapshot_path
    }

    fn lookup_path(&self) -> &str {
        &self.lookup_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }
}

#[cfg(feature = "cli")]
impl crate::utils::validation::Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation::*;

        validate_path("snapshot_path", &self.snapshot_path)?;
        validate_path("lookup_path", &self.lookup_path)?;
        validate_path("output_path", &self.output_path)?;
        validate_output_formats("output_formats", &self.output_formats)?;

        tracing::debug!("✅ CLI configuration validation passed");
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;

    #[test]
    fn test_cli_defaults_and_format_list() {
        let config = CliConfig::parse_from([
            "warehouse-etl",
            "--snapshot-path",
            "/tmp/snap.json",
            "--output-formats",
            "csv,json",
        ]);

        assert_eq!(config.snapshot_path(), "/tmp/snap.json");
        assert_eq!(config.lookup_path(), "./data/currencies_lookup.json");
        assert_eq!(config.output_formats(), &["csv", "json"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let config = CliConfig::parse_from(["warehouse-etl", "--output-formats", "xlsx"]);
        assert!(config.validate().is_err());
    }
}
