use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::utils::error::{EtlError, Result};

/// One raw row as delivered by the ingestion layer. Key order follows the
/// source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

/// Point-in-time read of every raw table for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    tables: HashMap<String, Vec<Record>>,
}

/// Suffix the ingestion layer uses for the full-history copy of a table.
pub const FULL_TABLE_SUFFIX: &str = "_all_data";

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: impl Into<String>, rows: Vec<Record>) {
        self.tables.insert(table.into(), rows);
    }

    /// Appends rows to a table, creating it when absent.
    pub fn extend(&mut self, table: &str, rows: impl IntoIterator<Item = Record>) {
        self.tables.entry(table.to_string()).or_default().extend(rows);
    }

    pub fn table(&self, name: &str) -> Result<&[Record]> {
        self.tables
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| EtlError::MissingTable {
                table: name.to_string(),
            })
    }

    /// Join partners are read from their full-history copy when the snapshot
    /// carries one, so that rows updated in earlier runs still match.
    pub fn full_table(&self, name: &str) -> Result<&[Record]> {
        let full_name = format!("{}{}", name, FULL_TABLE_SUFFIX);
        match self.tables.get(&full_name) {
            Some(rows) => Ok(rows.as_slice()),
            None => self.table(name),
        }
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl From<HashMap<String, Vec<Record>>> for Snapshot {
    fn from(tables: HashMap<String, Vec<Record>>) -> Self {
        Self { tables }
    }
}

/// Currency code to display name.
pub type CurrencyLookup = HashMap<String, String>;

/// A reshaped table: fixed, ordered columns and one value per column per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub(crate) name: String,
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Cell lookup by row position and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub(crate) fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| EtlError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }
}

/// Logical output tables, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputTable {
    DimCurrency,
    DimLocation,
    DimStaff,
    DimDesign,
    DimCounterparty,
    FactSalesOrder,
    DimDate,
}

impl OutputTable {
    pub const ALL: [OutputTable; 7] = [
        OutputTable::DimCurrency,
        OutputTable::DimLocation,
        OutputTable::DimStaff,
        OutputTable::DimDesign,
        OutputTable::DimCounterparty,
        OutputTable::FactSalesOrder,
        OutputTable::DimDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputTable::DimCurrency => "dim_currency",
            OutputTable::DimLocation => "dim_location",
            OutputTable::DimStaff => "dim_staff",
            OutputTable::DimDesign => "dim_design",
            OutputTable::DimCounterparty => "dim_counterparty",
            OutputTable::FactSalesOrder => "fact_sales_order",
            OutputTable::DimDate => "dim_date",
        }
    }
}

impl fmt::Display for OutputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SourceUnavailable,
    ShapeMismatch,
}

impl From<&EtlError> for FailureKind {
    fn from(err: &EtlError) -> Self {
        match err {
            EtlError::SourceUnavailable { .. } | EtlError::IoError(_) => {
                FailureKind::SourceUnavailable
            }
            _ => FailureKind::ShapeMismatch,
        }
    }
}

/// Result of a single table transformer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    Success(Table),
    Failure { kind: FailureKind, message: String },
}

impl TransformOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransformOutcome::Success(_))
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            TransformOutcome::Success(table) => Some(table),
            TransformOutcome::Failure { .. } => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            TransformOutcome::Success(table) => Some(table),
            TransformOutcome::Failure { .. } => None,
        }
    }
}

/// Successfully transformed tables of one run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSet {
    tables: Vec<(OutputTable, Table)>,
}

impl OutputSet {
    /// Keeps successes only; the order of `outcomes` is preserved.
    pub fn from_outcomes(outcomes: Vec<(OutputTable, TransformOutcome)>) -> Self {
        let tables = outcomes
            .into_iter()
            .filter_map(|(name, outcome)| outcome.into_table().map(|table| (name, table)))
            .collect();
        Self { tables }
    }

    pub fn get(&self, name: OutputTable) -> Option<&Table> {
        self.tables
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, table)| table)
    }

    pub fn contains(&self, name: OutputTable) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<OutputTable> {
        self.tables.iter().map(|(name, _)| *name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutputTable, &Table)> {
        self.tables.iter().map(|(name, table)| (*name, table))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
