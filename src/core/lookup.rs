use crate::domain::model::CurrencyLookup;
use crate::domain::ports::LookupLoader;
use crate::utils::error::{EtlError, Result};
use std::path::PathBuf;

/// Currency names read from a JSON object keyed by currency code.
#[derive(Debug, Clone)]
pub struct JsonFileLookup {
    path: PathBuf,
}

impl JsonFileLookup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LookupLoader for JsonFileLookup {
    fn load_lookup(&self) -> Result<CurrencyLookup> {
        let content =
            std::fs::read(&self.path).map_err(|e| EtlError::SourceUnavailable {
                message: format!("cannot read lookup '{}': {}", self.path.display(), e),
            })?;
        let lookup: CurrencyLookup = serde_json::from_slice(&content)?;
        tracing::debug!(
            "Loaded {} currency names from {}",
            lookup.len(),
            self.path.display()
        );
        Ok(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_lookup_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"USD": "United States Dollar", "EUR": "Euro"}"#)
            .unwrap();

        let lookup = JsonFileLookup::new(file.path()).load_lookup().unwrap();
        assert_eq!(lookup.get("EUR").map(String::as_str), Some("Euro"));
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = JsonFileLookup::new("/definitely/not/here.json")
            .load_lookup()
            .unwrap_err();
        assert!(matches!(err, EtlError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[1, 2, 3]").unwrap();
        assert!(JsonFileLookup::new(file.path()).load_lookup().is_err());
    }
}
