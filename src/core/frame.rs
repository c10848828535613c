//! Column-level reshaping primitives on [`Table`].
//!
//! Every operation consumes the table and returns a new one, so a transformer
//! either yields a fully reshaped table or an error, never a half-edited one.

use crate::domain::model::{Record, Table};
use crate::utils::error::{EtlError, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

impl Table {
    /// Builds a table from raw rows. Columns are the union of row keys in
    /// first-seen order; cells a row does not carry are null.
    pub fn from_records(name: &str, records: &[Record]) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.data.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Table {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    pub fn from_rows(name: &str, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Table> {
        if let Some(bad) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "row {} of '{}' has {} cells, expected {}",
                    bad,
                    name,
                    rows[bad].len(),
                    columns.len()
                ),
            });
        }
        Ok(Table {
            name: name.to_string(),
            columns,
            rows,
        })
    }

    pub fn with_name(mut self, name: &str) -> Table {
        self.name = name.to_string();
        self
    }

    pub fn drop_columns(mut self, columns: &[&str]) -> Result<Table> {
        for column in columns {
            let idx = self.require_column(column)?;
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        Ok(self)
    }

    pub fn rename_columns(mut self, renames: &[(&str, &str)]) -> Result<Table> {
        for (from, to) in renames {
            let idx = self.require_column(from)?;
            if from != to && self.has_column(to) {
                return Err(EtlError::ProcessingError {
                    message: format!(
                        "cannot rename '{}' to '{}' in '{}': column already exists",
                        from, to, self.name
                    ),
                });
            }
            self.columns[idx] = to.to_string();
        }
        Ok(self)
    }

    /// Projects onto `columns`, in that order.
    pub fn select(self, columns: &[&str]) -> Result<Table> {
        let indices = columns
            .iter()
            .map(|c| self.require_column(c))
            .collect::<Result<Vec<_>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Table {
            name: self.name,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Appends a column computed from each row of an existing one.
    pub fn derive_column<F>(mut self, source: &str, target: &str, f: F) -> Result<Table>
    where
        F: Fn(&Value) -> Value,
    {
        let idx = self.require_column(source)?;
        if self.has_column(target) {
            return Err(EtlError::ProcessingError {
                message: format!("column '{}' already exists in '{}'", target, self.name),
            });
        }
        for row in &mut self.rows {
            let derived = f(&row[idx]);
            row.push(derived);
        }
        self.columns.push(target.to_string());
        Ok(self)
    }

    /// Splits a string column once on its first whitespace character into two
    /// new trailing columns. No whitespace leaves the right part null; null or
    /// non-string cells give two nulls.
    pub fn split_column_once(mut self, source: &str, left: &str, right: &str) -> Result<Table> {
        let idx = self.require_column(source)?;
        for target in [left, right] {
            if self.has_column(target) {
                return Err(EtlError::ProcessingError {
                    message: format!("column '{}' already exists in '{}'", target, self.name),
                });
            }
        }

        for row in &mut self.rows {
            let (l, r) = split_once_whitespace(&row[idx]);
            row.push(l);
            row.push(r);
        }
        self.columns.push(left.to_string());
        self.columns.push(right.to_string());
        Ok(self)
    }

    /// Left join on `on`. Each left row appears exactly once, matched with
    /// the first right row carrying an equal key. Null keys never match.
    /// Non-key columns present on both sides get `_x` / `_y` suffixes.
    pub fn left_join(self, right: &Table, on: &str) -> Result<Table> {
        let left_key = self.column_index(on).ok_or_else(|| EtlError::JoinError {
            message: format!("left table '{}' has no key column '{}'", self.name, on),
        })?;
        let right_key = right.column_index(on).ok_or_else(|| EtlError::JoinError {
            message: format!("right table '{}' has no key column '{}'", right.name, on),
        })?;

        let mut index: HashMap<String, usize> = HashMap::new();
        for (pos, row) in right.rows.iter().enumerate() {
            if let Some(key) = join_key(&row[right_key]) {
                index.entry(key).or_insert(pos);
            }
        }

        let right_columns: Vec<usize> = (0..right.columns.len())
            .filter(|&i| i != right_key)
            .collect();

        let mut columns: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let collides = i != left_key && right.columns.iter().any(|rc| rc == c);
                if collides {
                    format!("{}{}", c, LEFT_SUFFIX)
                } else {
                    c.clone()
                }
            })
            .collect();
        for &i in &right_columns {
            let c = &right.columns[i];
            if self.columns.iter().any(|lc| lc == c) {
                columns.push(format!("{}{}", c, RIGHT_SUFFIX));
            } else {
                columns.push(c.clone());
            }
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(EtlError::JoinError {
                message: format!(
                    "joining '{}' with '{}' on '{}' yields duplicate column '{}'",
                    self.name, right.name, on, duplicate
                ),
            });
        }

        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                let matched = join_key(&row[left_key])
                    .and_then(|key| index.get(&key))
                    .map(|&pos| &right.rows[pos]);
                for &i in &right_columns {
                    row.push(matched.map(|r| r[i].clone()).unwrap_or(Value::Null));
                }
                row
            })
            .collect();

        Ok(Table {
            name: self.name,
            columns,
            rows,
        })
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(cell_to_string))?;
        }
        writer
            .into_inner()
            .map_err(|e| EtlError::IoError(e.into_error()))
    }

    /// Records-oriented JSON array, keys in column order.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let records: Vec<Map<String, Value>> = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect();
        Ok(serde_json::to_vec_pretty(&records)?)
    }
}

fn split_once_whitespace(value: &Value) -> (Value, Value) {
    match value.as_str() {
        Some(s) => match s.split_once(char::is_whitespace) {
            Some((date, time)) => (Value::String(date.to_string()), Value::String(time.to_string())),
            None => (Value::String(s.to_string()), Value::Null),
        },
        None => (Value::Null, Value::Null),
    }
}

/// Canonical key for join matching. Integral floats match integers; strings
/// never match numbers.
fn join_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(format!("n:{}", i))
            } else if let Some(u) = n.as_u64() {
                Some(format!("n:{}", u))
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    Some(format!("n:{}", f as i64))
                } else {
                    Some(format!("n:{}", f))
                }
            }
        }
        Value::String(s) => Some(format!("s:{}", s)),
        other => Some(format!("v:{}", other)),
    }
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(name: &str, rows: Value) -> Table {
        let records: Vec<Record> = serde_json::from_value(rows).unwrap();
        Table::from_records(name, &records)
    }

    #[test]
    fn test_from_records_fills_missing_cells_with_null() {
        let t = table("t", json!([{"a": 1, "b": 2}, {"a": 3, "c": 4}]));

        assert_eq!(t.columns(), &["a", "b", "c"]);
        assert_eq!(t.value(1, "b"), Some(&Value::Null));
        assert_eq!(t.value(1, "c"), Some(&json!(4)));
    }

    #[test]
    fn test_drop_missing_column_is_an_error() {
        let t = table("t", json!([{"a": 1}]));
        let err = t.drop_columns(&["created_at"]).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { .. }));
    }

    #[test]
    fn test_rename_and_select() {
        let t = table("t", json!([{"a": 1, "b": 2, "c": 3}]))
            .rename_columns(&[("a", "z")])
            .unwrap()
            .select(&["c", "z"])
            .unwrap();

        assert_eq!(t.columns(), &["c", "z"]);
        assert_eq!(t.rows()[0], vec![json!(3), json!(1)]);
    }

    #[test]
    fn test_rename_onto_existing_column_fails() {
        let t = table("t", json!([{"a": 1, "b": 2}]));
        assert!(t.rename_columns(&[("a", "b")]).is_err());
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows() {
        let left = table("staff", json!([
            {"staff_id": 1, "department_id": 10},
            {"staff_id": 2, "department_id": 99},
            {"staff_id": 3, "department_id": null}
        ]));
        let right = table("department", json!([
            {"department_id": 10, "department_name": "Sales"},
            {"department_id": 10, "department_name": "Duplicate"}
        ]));

        let joined = left.left_join(&right, "department_id").unwrap();

        assert_eq!(joined.len(), 3);
        assert_eq!(joined.columns(), &["staff_id", "department_id", "department_name"]);
        assert_eq!(joined.value(0, "department_name"), Some(&json!("Sales")));
        assert_eq!(joined.value(1, "department_name"), Some(&Value::Null));
        assert_eq!(joined.value(2, "department_name"), Some(&Value::Null));
    }

    #[test]
    fn test_left_join_matches_integral_float_keys() {
        let left = table("l", json!([{"k": 1.0}]));
        let right = table("r", json!([{"k": 1, "v": "one"}, {"k": "1", "v": "string"}]));

        let joined = left.left_join(&right, "k").unwrap();
        assert_eq!(joined.value(0, "v"), Some(&json!("one")));
    }

    #[test]
    fn test_left_join_suffixes_colliding_columns() {
        let left = table("l", json!([{"k": 1, "created_at": "a"}]));
        let right = table("r", json!([{"k": 1, "created_at": "b"}]));

        let joined = left.left_join(&right, "k").unwrap();
        assert_eq!(joined.columns(), &["k", "created_at_x", "created_at_y"]);
    }

    #[test]
    fn test_left_join_rejects_suffix_collisions() {
        let left = table("l", json!([{"k": 1, "v_x": 0, "v": 1}]));
        let right = table("r", json!([{"k": 1, "v": 2}]));

        let err = left.left_join(&right, "k").unwrap_err();
        assert!(matches!(err, EtlError::JoinError { .. }));
        assert!(err.to_string().contains("v_x"));
    }

    #[test]
    fn test_left_join_without_key_fails() {
        let left = table("l", json!([{"a": 1}]));
        let right = table("r", json!([{"k": 1}]));
        let err = left.left_join(&right, "k").unwrap_err();
        assert!(matches!(err, EtlError::JoinError { .. }));
    }

    #[test]
    fn test_split_column_once() {
        let t = table("t", json!([
            {"ts": "2024-01-01 10:00:00"},
            {"ts": "2024-01-01 10:00:00 extra"},
            {"ts": "2024-01-01"},
            {"ts": null}
        ]))
        .split_column_once("ts", "d", "t")
        .unwrap();

        assert_eq!(t.value(0, "d"), Some(&json!("2024-01-01")));
        assert_eq!(t.value(0, "t"), Some(&json!("10:00:00")));
        assert_eq!(t.value(1, "t"), Some(&json!("10:00:00 extra")));
        assert_eq!(t.value(2, "t"), Some(&Value::Null));
        assert_eq!(t.value(3, "d"), Some(&Value::Null));
    }

    #[test]
    fn test_to_csv_keeps_column_order() {
        let t = table("t", json!([{"b": "x", "a": null}, {"b": 2.5, "a": 1}]));
        let csv = String::from_utf8(t.to_csv().unwrap()).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["b,a", "x,", "2.5,1"]);
    }

    #[test]
    fn test_to_json_is_records_oriented() {
        let t = table("t", json!([{"b": 1, "a": "x"}]));
        let parsed: Value = serde_json::from_slice(&t.to_json().unwrap()).unwrap();
        assert_eq!(parsed, json!([{"b": 1, "a": "x"}]));
    }
}
