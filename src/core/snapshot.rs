use crate::domain::model::{Record, Snapshot};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

/// Parses a whole-snapshot document: `{ "<table>": [ {row}, ... ], ... }`.
pub fn parse_snapshot_document(bytes: &[u8]) -> Result<Snapshot> {
    let snapshot: Snapshot = serde_json::from_slice(bytes)?;
    Ok(snapshot)
}

/// Parses the rows of a single table. An array holds many rows, a bare object
/// is one row.
pub fn parse_table_rows(table: &str, bytes: &[u8]) -> Result<Vec<Record>> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(data) => Ok(Record { data }),
                other => Err(row_error(table, &other)),
            })
            .collect(),
        Value::Object(data) => Ok(vec![Record { data }]),
        other => Err(row_error(table, &other)),
    }
}

fn row_error(table: &str, value: &Value) -> EtlError {
    EtlError::ProcessingError {
        message: format!("rows of '{}' must be JSON objects, got {}", table, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_snapshot_document() {
        let bytes = serde_json::to_vec(&json!({
            "design": [{"design_id": 1}],
            "currency": []
        }))
        .unwrap();

        let snapshot = parse_snapshot_document(&bytes).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.table("design").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_table_rows_accepts_single_object() {
        let rows = parse_table_rows("staff", br#"{"staff_id": 4}"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("staff_id"), Some(&json!(4)));
    }

    #[test]
    fn test_parse_table_rows_rejects_scalars() {
        assert!(parse_table_rows("staff", b"[1, 2]").is_err());
        assert!(parse_table_rows("staff", b"\"nope\"").is_err());
    }
}
