use crate::core::etl::OutputFormat;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub lookup: LookupConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub r#type: SourceKind,
    /// Local snapshot file or directory, or the key prefix when reading from S3.
    pub path: String,
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    pub currency_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PROCESSED_BUCKET})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<regex::Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validate_path("source.path", &self.source.path)?;
        if self.source.r#type == SourceKind::S3 {
            let bucket = validate_required_field("source.bucket", &self.source.bucket)?;
            validate_s3_bucket_name("source.bucket", bucket)?;
            if !cfg!(feature = "lambda") {
                return Err(EtlError::ConfigError {
                    message: "source.type = \"s3\" needs a build with the `lambda` feature"
                        .to_string(),
                });
            }
        }
        validate_path("lookup.currency_path", &self.lookup.currency_path)?;
        validate_path("load.output_path", &self.load.output_path)?;
        validate_output_formats("load.output_formats", &self.load.output_formats)?;

        if let Some(level) = self.log_level() {
            let normalized = level.trim().to_ascii_lowercase();
            if !crate::utils::logger::LOG_LEVELS.iter().any(|l| *l == normalized) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.to_string(),
                    reason: format!(
                        "Valid levels: {}",
                        crate::utils::logger::LOG_LEVELS.join(", ")
                    ),
                });
            }
        }

        Ok(())
    }

    /// Bucket and key prefix of an S3 snapshot source.
    pub fn s3_location(&self) -> Result<(&str, &str)> {
        let bucket =
            crate::utils::validation::validate_required_field("source.bucket", &self.source.bucket)?;
        Ok((bucket.as_str(), self.source.path.as_str()))
    }

    pub fn formats(&self) -> Result<Vec<OutputFormat>> {
        OutputFormat::parse_list(&self.load.output_formats)
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn snapshot_path(&self) -> &str {
        &self.source.path
    }

    fn lookup_path(&self) -> &str {
        &self.lookup.currency_path
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[pipeline]
name = "totes-warehouse"
description = "Nightly star-schema build"
version = "1.0.0"

[source]
type = "local"
path = "./data/snapshot"

[lookup]
currency_path = "./data/currencies_lookup.json"

[load]
output_path = "./output"
output_formats = ["csv", "json"]
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.pipeline.name, "totes-warehouse");
        assert_eq!(config.source.r#type, SourceKind::Local);
        assert_eq!(config.snapshot_path(), "./data/snapshot");
        assert_eq!(
            config.formats().unwrap(),
            vec![OutputFormat::Csv, OutputFormat::Json]
        );
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("WAREHOUSE_ETL_TEST_OUTPUT", "/tmp/warehouse");

        let content = BASIC.replace("\"./output\"", "\"${WAREHOUSE_ETL_TEST_OUTPUT}\"");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.output_path(), "/tmp/warehouse");

        std::env::remove_var("WAREHOUSE_ETL_TEST_OUTPUT");
    }

    #[test]
    fn test_unset_env_var_is_left_in_place() {
        let content = BASIC.replace("\"./output\"", "\"${WAREHOUSE_ETL_TEST_UNSET}\"");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.output_path(), "${WAREHOUSE_ETL_TEST_UNSET}");
    }

    #[test]
    fn test_s3_source_requires_bucket() {
        let content = BASIC.replace("type = \"local\"", "type = \"s3\"");
        let config = TomlConfig::from_toml_str(&content).unwrap();

        assert!(matches!(
            config.validate(),
            Err(EtlError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_s3_location_from_source_section() {
        let content = BASIC
            .replace("type = \"local\"", "type = \"s3\"")
            .replace("path = \"./data/snapshot\"", "path = \"ingestion\"\nbucket = \"totes-ingestion\"");
        let config = TomlConfig::from_toml_str(&content).unwrap();

        assert_eq!(config.s3_location().unwrap(), ("totes-ingestion", "ingestion"));
        if cfg!(feature = "lambda") {
            assert!(config.validate().is_ok());
        } else {
            assert!(matches!(
                config.validate(),
                Err(EtlError::ConfigError { .. })
            ));
        }
    }

    #[test]
    fn test_monitoring_log_level() {
        let content = format!("{}\n[monitoring]\nenabled = true\nlog_level = \"debug\"\n", BASIC);
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert!(config.monitoring_enabled());
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.validate().is_ok());

        let content = content.replace("\"debug\"", "\"chatty\"");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(EtlError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_unsupported_format_fails_validation() {
        let content = BASIC.replace("[\"csv\", \"json\"]", "[\"parquet\"]");
        let config = TomlConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "totes-warehouse");
    }
}
