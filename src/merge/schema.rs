//! Column reconciliation across tables

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::MergeMode;
use crate::error::{EngineError, Result};
use crate::model::{CellType, Column, Table};

/// Target schema plus, per input table, where each target column comes from
#[derive(Debug, Clone)]
pub struct SchemaPlan {
    /// Target columns in output order
    pub columns: Vec<Column>,
    /// For each input table: source column index per target column,
    /// `None` where the table lacks the column
    pub projections: Vec<Vec<Option<usize>>>,
}

impl SchemaPlan {
    /// Names of the target columns
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Schema reconciliation engine
pub struct SchemaReconciler;

impl SchemaReconciler {
    /// Target column names for the given mode.
    ///
    /// Union keeps first-seen order scanning tables in order; intersection
    /// keeps the first table's order.
    pub fn target_columns(tables: &[Table], mode: MergeMode) -> Result<Vec<String>> {
        match mode {
            MergeMode::Union => {
                let mut names: IndexSet<&str> = IndexSet::new();
                for table in tables {
                    names.extend(table.columns.iter().map(|c| c.name.as_str()));
                }
                Ok(names.into_iter().map(str::to_string).collect())
            }
            MergeMode::Intersection => {
                let Some((first, rest)) = tables.split_first() else {
                    return Ok(Vec::new());
                };
                let others: Vec<FxHashSet<&str>> = rest
                    .iter()
                    .map(|t| t.columns.iter().map(|c| c.name.as_str()).collect())
                    .collect();

                let common: Vec<String> = first
                    .columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .filter(|name| others.iter().all(|set| set.contains(name)))
                    .map(str::to_string)
                    .collect();

                if common.is_empty() {
                    return Err(EngineError::NoCommonColumns);
                }
                Ok(common)
            }
        }
    }

    /// Compute the target schema and per-table projections
    pub fn reconcile(tables: &[Table], mode: MergeMode) -> Result<SchemaPlan> {
        let names = Self::target_columns(tables, mode)?;

        let mut types: FxHashMap<&str, CellType> = FxHashMap::default();
        let projections = tables
            .iter()
            .map(|table| {
                let positions: FxHashMap<&str, usize> = table
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (c.name.as_str(), i))
                    .collect();

                for column in &table.columns {
                    let entry = types.entry(column.name.as_str()).or_default();
                    *entry = entry.widen(column.inferred_type);
                }

                names
                    .iter()
                    .map(|name| positions.get(name.as_str()).copied())
                    .collect()
            })
            .collect();

        let columns = names
            .iter()
            .map(|name| {
                let cell_type = types.get(name.as_str()).copied().unwrap_or_default();
                Column::with_type(name.clone(), cell_type)
            })
            .collect();

        Ok(SchemaPlan {
            columns,
            projections,
        })
    }
}
