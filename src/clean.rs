//! Removal of empty rows/columns and whitespace trimming

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{CellType, Table, Value};

/// Independent cleaning toggles, applied as rows, then columns, then trim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanOptions {
    pub remove_empty_rows: bool,
    pub remove_empty_cols: bool,
    pub trim_spaces: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            remove_empty_rows: true,
            remove_empty_cols: true,
            trim_spaces: false,
        }
    }
}

impl CleanOptions {
    /// Names of the enabled steps, in application order
    pub fn actions(&self) -> Vec<&'static str> {
        [
            ("remove_empty_rows", self.remove_empty_rows),
            ("remove_empty_cols", self.remove_empty_cols),
            ("trim_spaces", self.trim_spaces),
        ]
        .into_iter()
        .filter_map(|(name, enabled)| enabled.then_some(name))
        .collect()
    }
}

/// Table shape before and after cleaning
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanStats {
    pub original_rows: usize,
    pub original_cols: usize,
    pub cleaned_rows: usize,
    pub cleaned_cols: usize,
}

impl CleanStats {
    pub fn rows_removed(&self) -> usize {
        self.original_rows - self.cleaned_rows
    }

    pub fn cols_removed(&self) -> usize {
        self.original_cols - self.cleaned_cols
    }
}

/// Applies [`CleanOptions`] to a table
pub struct Cleaner {
    options: CleanOptions,
}

impl Cleaner {
    pub fn new(options: CleanOptions) -> Self {
        Self { options }
    }

    /// Clean a table.
    ///
    /// Column emptiness is judged after row removal. With `trim_spaces`
    /// on, whitespace-only text counts as empty so that cleaning an
    /// already-cleaned table changes nothing.
    pub fn clean(&self, mut table: Table) -> (Table, CleanStats) {
        let trimmed = self.options.trim_spaces;
        let mut stats = CleanStats {
            original_rows: table.row_count(),
            original_cols: table.column_count(),
            ..Default::default()
        };

        if self.options.remove_empty_rows {
            table
                .rows
                .retain(|row| !row.cells.iter().all(|c| c.is_blank(trimmed)));
        }

        if self.options.remove_empty_cols {
            let keep: Vec<bool> = (0..table.column_count())
                .map(|i| {
                    table
                        .rows
                        .iter()
                        .any(|row| row.get(i).is_some_and(|c| !c.is_blank(trimmed)))
                })
                .collect();

            if keep.contains(&false) {
                let mut flags = keep.iter();
                table.columns.retain(|_| *flags.next().unwrap_or(&true));
                for row in &mut table.rows {
                    let mut flags = keep.iter();
                    row.cells.retain(|_| *flags.next().unwrap_or(&true));
                }
            }
        }

        if trimmed {
            trim_text_columns(&mut table);
        }

        stats.cleaned_rows = table.row_count();
        stats.cleaned_cols = table.column_count();
        debug!(
            table = %table.name,
            rows_removed = stats.rows_removed(),
            cols_removed = stats.cols_removed(),
            "cleaned table"
        );
        (table, stats)
    }
}

fn trim_text_columns(table: &mut Table) {
    let text_columns: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.inferred_type == CellType::Text)
        .map(|(i, _)| i)
        .collect();

    for row in &mut table.rows {
        for &i in &text_columns {
            if let Some(Value::Text(s)) = row.cells.get_mut(i) {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    *s = trimmed.to_string();
                }
            }
        }
    }
}

/// Convenience function to clean a table
pub fn clean_table(table: Table, options: CleanOptions) -> (Table, CleanStats) {
    Cleaner::new(options).clean(table)
}
