//! Partitioning of a table by the value of one column

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::{Row, Table};
use crate::output::ValueFormatter;

/// Rows sharing one group key
#[derive(Debug, Clone)]
pub struct Group {
    /// Display form of the key value; null keys group under `""`
    pub key: String,
    pub table: Table,
}

impl Group {
    /// Key made safe for use in a file name: path separators and colons
    /// replaced, truncated to `max_chars` characters.
    pub fn file_stem(&self, max_chars: usize) -> String {
        self.key
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .take(max_chars)
            .collect()
    }
}

/// Splits a table into groups keyed by one column
pub struct Grouper<'a> {
    column: &'a str,
}

impl<'a> Grouper<'a> {
    pub fn new(column: &'a str) -> Self {
        Self { column }
    }

    /// Groups come out in first-seen key order; rows keep their order
    /// within each group.
    pub fn group(&self, table: Table) -> Result<Vec<Group>> {
        let col_idx = table
            .column_index(self.column)
            .ok_or_else(|| EngineError::UnknownGroupColumn {
                column: self.column.to_string(),
            })?;

        let template = table.empty_like();
        let mut buckets: IndexMap<String, Vec<Row>, FxBuildHasher> = IndexMap::default();
        for row in table.rows {
            let key = row
                .get(col_idx)
                .map(|v| ValueFormatter::display(v).into_owned())
                .unwrap_or_default();
            buckets.entry(key).or_default().push(row);
        }

        if buckets.is_empty() {
            return Err(EngineError::NoGroupsProduced);
        }
        debug!(column = self.column, groups = buckets.len(), "grouped table");

        Ok(buckets
            .into_iter()
            .map(|(key, rows)| {
                let mut table = template.clone();
                table.name = key.clone();
                table.rows = rows;
                Group { key, table }
            })
            .collect())
    }
}

/// Convenience function to group a table
pub fn group_by(table: Table, column: &str) -> Result<Vec<Group>> {
    Grouper::new(column).group(table)
}
