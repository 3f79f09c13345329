//! Merging of several tables into one

mod schema;

use tracing::{debug, info};

use crate::config::MergeMode;
use crate::error::{EngineError, Result};
use crate::model::{Row, Table, Value};

pub use schema::{SchemaPlan, SchemaReconciler};

/// Name given to merged tables
pub const MERGED_TABLE_NAME: &str = "merged";

/// Concatenates tables under a reconciliation policy
pub struct Merger {
    mode: MergeMode,
}

impl Merger {
    pub fn new(mode: MergeMode) -> Self {
        Self { mode }
    }

    /// Merge tables in the given order. Row order within and across tables
    /// is preserved; cells a table lacks become null.
    pub fn merge(&self, tables: Vec<Table>) -> Result<Table> {
        if tables.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let plan = SchemaReconciler::reconcile(&tables, self.mode)?;
        let total_rows: usize = tables.iter().map(Table::row_count).sum();

        let mut merged = Table::new(MERGED_TABLE_NAME, plan.columns);
        merged.rows.reserve(total_rows);

        for (table, projection) in tables.into_iter().zip(plan.projections) {
            let dropped = table.column_count() - projection.iter().flatten().count();
            if dropped > 0 {
                debug!(table = %table.name, dropped, "columns not in target schema");
            }

            for row in table.rows {
                let mut cells = row.cells;
                let projected = projection
                    .iter()
                    .map(|source| match source {
                        Some(i) => std::mem::replace(&mut cells[*i], Value::Null),
                        None => Value::Null,
                    })
                    .collect();
                merged.rows.push(Row::new(projected));
            }
        }

        info!(
            mode = %self.mode,
            columns = merged.column_count(),
            rows = merged.row_count(),
            "merged tables"
        );
        Ok(merged)
    }
}

/// Convenience function to merge tables
pub fn merge_tables(tables: Vec<Table>, mode: MergeMode) -> Result<Table> {
    Merger::new(mode).merge(tables)
}
