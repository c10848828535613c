use crate::core::transformers::{default_transformers, TableTransformer, TransformContext};
use crate::domain::model::{OutputSet, OutputTable, TransformOutcome};
use crate::domain::ports::{LookupLoader, RawDataSource};
use crate::utils::error::{EtlError, Result};

/// Runs every table transformer against one snapshot and gathers the
/// successful tables.
pub struct TransformationOrchestrator<S: RawDataSource, L: LookupLoader> {
    source: S,
    lookup: L,
    transformers: Vec<TableTransformer>,
}

impl<S: RawDataSource, L: LookupLoader> TransformationOrchestrator<S, L> {
    pub fn new(source: S, lookup: L) -> Self {
        Self {
            source,
            lookup,
            transformers: default_transformers(),
        }
    }

    /// Replaces the registered transformers.
    pub fn with_transformers(mut self, transformers: Vec<TableTransformer>) -> Self {
        self.transformers = transformers;
        self
    }

    /// Per-table outcomes in declaration order. Fails only when the snapshot
    /// itself cannot be fetched.
    pub async fn run_outcomes(&self) -> Result<Vec<(OutputTable, TransformOutcome)>> {
        let snapshot = self.source.fetch_snapshot().await.map_err(|e| match e {
            EtlError::SourceUnavailable { .. } => e,
            other => EtlError::SourceUnavailable {
                message: other.to_string(),
            },
        })?;
        let mut table_names: Vec<&str> = snapshot.table_names().collect();
        table_names.sort_unstable();
        tracing::info!(
            "📥 Fetched snapshot with {} raw tables: {}",
            snapshot.len(),
            table_names.join(", ")
        );

        let lookup = match self.lookup.load_lookup() {
            Ok(lookup) => Some(lookup),
            Err(e) => {
                tracing::warn!("⚠️ Currency lookup unavailable: {}", e);
                None
            }
        };

        let ctx = TransformContext::new(&snapshot, lookup.as_ref());
        let mut outcomes: Vec<(OutputTable, TransformOutcome)> = self
            .transformers
            .iter()
            .map(|t| (t.table, t.run(&ctx)))
            .collect();
        outcomes.sort_by_key(|(table, _)| *table);

        Ok(outcomes)
    }

    pub async fn run(&self) -> Result<OutputSet> {
        let outcomes = self.run_outcomes().await?;

        let skipped: Vec<&str> = outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .map(|(table, _)| table.as_str())
            .collect();
        if !skipped.is_empty() {
            tracing::warn!(
                "Partial run: {} of {} tables skipped ({})",
                skipped.len(),
                outcomes.len(),
                skipped.join(", ")
            );
        }

        let output = OutputSet::from_outcomes(outcomes);
        tracing::info!("🔄 Transformed {} tables", output.len());
        Ok(output)
    }
}
