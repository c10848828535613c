//! One transformer per warehouse table. Each is a pure function of the raw
//! snapshot (and the currency lookup) returning the reshaped table; errors are
//! turned into [`TransformOutcome::Failure`] by [`guard`].

use crate::core::date_dimension::{build_date_dimension, SALES_ORDER_TABLE};
use crate::domain::model::{
    CurrencyLookup, FailureKind, OutputTable, Snapshot, Table, TransformOutcome,
};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

const AUDIT_COLUMNS: [&str; 2] = ["created_at", "last_updated"];

pub const DIM_STAFF_COLUMNS: [&str; 6] = [
    "staff_id",
    "first_name",
    "last_name",
    "department_name",
    "location",
    "email_address",
];

pub const DIM_COUNTERPARTY_COLUMNS: [&str; 9] = [
    "counterparty_id",
    "counterparty_legal_name",
    "counterparty_legal_address_line_1",
    "counterparty_legal_address_line_2",
    "counterparty_legal_district",
    "counterparty_legal_city",
    "counterparty_legal_postal_code",
    "counterparty_legal_country",
    "counterparty_legal_phone_number",
];

pub const FACT_SALES_ORDER_COLUMNS: [&str; 14] = [
    "sales_order_id",
    "created_date",
    "created_time",
    "last_updated_date",
    "last_updated_time",
    "sales_staff_id",
    "counterparty_id",
    "units_sold",
    "unit_price",
    "currency_id",
    "design_id",
    "agreed_payment_date",
    "agreed_delivery_date",
    "agreed_delivery_location_id",
];

const COUNTERPARTY_ADDRESS_RENAMES: [(&str, &str); 7] = [
    ("address_line_1", "counterparty_legal_address_line_1"),
    ("address_line_2", "counterparty_legal_address_line_2"),
    ("district", "counterparty_legal_district"),
    ("city", "counterparty_legal_city"),
    ("postal_code", "counterparty_legal_postal_code"),
    ("country", "counterparty_legal_country"),
    ("phone", "counterparty_legal_phone_number"),
];

/// Everything a transformer may read during one run.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub snapshot: &'a Snapshot,
    /// `None` when the lookup could not be loaded for this run.
    pub lookup: Option<&'a CurrencyLookup>,
}

impl<'a> TransformContext<'a> {
    pub fn new(snapshot: &'a Snapshot, lookup: Option<&'a CurrencyLookup>) -> Self {
        Self { snapshot, lookup }
    }

    fn raw_table(&self, name: &str) -> Result<Table> {
        Ok(Table::from_records(name, self.snapshot.table(name)?))
    }

    fn full_raw_table(&self, name: &str) -> Result<Table> {
        Ok(Table::from_records(name, self.snapshot.full_table(name)?))
    }
}

pub type TransformFn = dyn Fn(&TransformContext<'_>) -> Result<Table> + Send + Sync;

/// A named transformer as registered with the orchestrator.
pub struct TableTransformer {
    pub table: OutputTable,
    transform: Box<TransformFn>,
}

impl TableTransformer {
    pub fn new<F>(table: OutputTable, transform: F) -> Self
    where
        F: Fn(&TransformContext<'_>) -> Result<Table> + Send + Sync + 'static,
    {
        Self {
            table,
            transform: Box::new(transform),
        }
    }

    pub fn run(&self, ctx: &TransformContext<'_>) -> TransformOutcome {
        guard(self.table, || (self.transform)(ctx))
    }
}

impl std::fmt::Debug for TableTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableTransformer")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Transformers for every output table, in declaration order.
pub fn default_transformers() -> Vec<TableTransformer> {
    vec![
        TableTransformer::new(OutputTable::DimCurrency, transform_currency),
        TableTransformer::new(OutputTable::DimLocation, transform_location),
        TableTransformer::new(OutputTable::DimStaff, transform_staff),
        TableTransformer::new(OutputTable::DimDesign, transform_design),
        TableTransformer::new(OutputTable::DimCounterparty, transform_counterparty),
        TableTransformer::new(OutputTable::FactSalesOrder, transform_sales_order),
        TableTransformer::new(OutputTable::DimDate, |ctx: &TransformContext<'_>| {
            build_date_dimension(ctx.snapshot)
        }),
    ]
}

/// Runs a transformer body and converts any error into a logged failure.
pub fn guard<F>(table: OutputTable, body: F) -> TransformOutcome
where
    F: FnOnce() -> Result<Table>,
{
    match body() {
        Ok(result) => {
            tracing::debug!(
                "{}: {} rows, {} columns",
                table,
                result.len(),
                result.columns().len()
            );
            TransformOutcome::Success(result.with_name(table.as_str()))
        }
        Err(e) => {
            let kind = FailureKind::from(&e);
            tracing::warn!("⚠️ Skipping {} ({:?}): {}", table, kind, e);
            TransformOutcome::Failure {
                kind,
                message: e.to_string(),
            }
        }
    }
}

pub fn transform_currency(ctx: &TransformContext<'_>) -> Result<Table> {
    let lookup = ctx.lookup.ok_or_else(|| EtlError::SourceUnavailable {
        message: "currency lookup was not loaded".to_string(),
    })?;

    ctx.raw_table("currency")?
        .drop_columns(&AUDIT_COLUMNS)?
        .derive_column("currency_code", "currency_name", |code| {
            code.as_str()
                .and_then(|c| lookup.get(c))
                .map(|name| Value::String(name.clone()))
                .unwrap_or(Value::Null)
        })
}

pub fn transform_location(ctx: &TransformContext<'_>) -> Result<Table> {
    ctx.raw_table("address")?
        .drop_columns(&AUDIT_COLUMNS)?
        .rename_columns(&[("address_id", "location_id")])
}

pub fn transform_staff(ctx: &TransformContext<'_>) -> Result<Table> {
    let staff = ctx.raw_table("staff")?.drop_columns(&AUDIT_COLUMNS)?;
    let department = ctx.full_raw_table("department")?;

    staff
        .left_join(&department, "department_id")?
        .drop_columns(&["department_id", "manager", "created_at", "last_updated"])?
        .select(&DIM_STAFF_COLUMNS)
}

pub fn transform_design(ctx: &TransformContext<'_>) -> Result<Table> {
    ctx.raw_table("design")?.drop_columns(&AUDIT_COLUMNS)
}

pub fn transform_counterparty(ctx: &TransformContext<'_>) -> Result<Table> {
    let counterparty = ctx
        .raw_table("counterparty")?
        .drop_columns(&AUDIT_COLUMNS)?
        .rename_columns(&[("legal_address_id", "address_id")])?;
    let address = ctx.full_raw_table("address")?;

    counterparty
        .left_join(&address, "address_id")?
        .rename_columns(&COUNTERPARTY_ADDRESS_RENAMES)?
        .select(&DIM_COUNTERPARTY_COLUMNS)
}

pub fn transform_sales_order(ctx: &TransformContext<'_>) -> Result<Table> {
    ctx.raw_table(SALES_ORDER_TABLE)?
        .split_column_once("created_at", "created_date", "created_time")?
        .split_column_once("last_updated", "last_updated_date", "last_updated_time")?
        .rename_columns(&[("staff_id", "sales_staff_id")])?
        .select(&FACT_SALES_ORDER_COLUMNS)
}
