use crate::domain::model::{Snapshot, Table};
use crate::utils::error::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};

pub const SALES_ORDER_TABLE: &str = "sales_order";

/// Sales-order columns the calendar is derived from.
pub const DATE_COLUMNS: [&str; 4] = [
    "created_at",
    "last_updated",
    "agreed_payment_date",
    "agreed_delivery_date",
];

pub const DIM_DATE_COLUMNS: [&str; 8] = [
    "date_id",
    "year",
    "month",
    "day",
    "day_of_week",
    "day_name",
    "month_name",
    "quarter",
];

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateDimensionRow {
    pub date_id: NaiveDateTime,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Monday = 0.
    pub day_of_week: u32,
    pub day_name: String,
    pub month_name: String,
    pub quarter: u32,
}

impl DateDimensionRow {
    pub fn from_timestamp(ts: NaiveDateTime) -> Self {
        let month = ts.month();
        Self {
            date_id: ts,
            year: ts.year(),
            month,
            day: ts.day(),
            day_of_week: ts.weekday().num_days_from_monday(),
            day_name: ts.format("%A").to_string(),
            month_name: ts.format("%B").to_string(),
            quarter: quarter_of(month),
        }
    }

    fn to_cells(&self) -> Vec<Value> {
        vec![
            json!(format_date_id(&self.date_id)),
            json!(self.year),
            json!(self.month),
            json!(self.day),
            json!(self.day_of_week),
            json!(self.day_name),
            json!(self.month_name),
            json!(self.quarter),
        ]
    }
}

pub fn quarter_of(month: u32) -> u32 {
    month.div_ceil(3)
}

/// Lenient timestamp parsing. Anything that is not a recognisable date or
/// date-time string yields `None`.
pub fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    let s = value.as_str()?.trim();
    if s.is_empty() {
        return None;
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn format_date_id(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

/// Sorted, deduplicated calendar rows for every timestamp found in the
/// sales-order date columns.
pub fn build_date_rows(snapshot: &Snapshot) -> Result<Vec<DateDimensionRow>> {
    let sales_orders = Table::from_records(SALES_ORDER_TABLE, snapshot.table(SALES_ORDER_TABLE)?);

    let mut timestamps: Vec<NaiveDateTime> = Vec::new();
    for column in DATE_COLUMNS {
        let values = sales_orders.column_values(column)?;
        let before = timestamps.len();
        timestamps.extend(values.into_iter().filter_map(parse_timestamp));
        tracing::debug!(
            "{}: {} of {} values parsed as timestamps",
            column,
            timestamps.len() - before,
            sales_orders.len()
        );
    }

    timestamps.sort_unstable();
    timestamps.dedup();

    Ok(timestamps
        .into_iter()
        .map(DateDimensionRow::from_timestamp)
        .collect())
}

pub fn build_date_dimension(snapshot: &Snapshot) -> Result<Table> {
    let rows = build_date_rows(snapshot)?;
    Table::from_rows(
        "dim_date",
        DIM_DATE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows.iter().map(DateDimensionRow::to_cells).collect(),
    )
}
