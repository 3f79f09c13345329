//! Table, Row, and Record data structures

use super::schema::{CellType, Column};
use super::value::Value;

/// A row in the table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Cell values in column order
    pub cells: Vec<Value>,
}

impl Row {
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.cells.get(index)
    }
}

/// Name-keyed view of one row
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [Column],
    row: &'a Row,
}

impl<'a> Record<'a> {
    /// (column name, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let (columns, row) = (self.columns, self.row);
        columns
            .iter()
            .map(|c| c.name.as_str())
            .zip(row.cells.iter())
    }
}

/// A logical table: ordered unique columns and rows aligned to them.
///
/// Every row holds exactly one cell per column; missing cells are
/// materialised as [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Where the table came from (`file` or `file:sheet`)
    pub name: String,
    /// Column definitions
    pub columns: Vec<Column>,
    /// All rows in the table
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table with column definitions
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Create an empty table with the same name and columns
    pub fn empty_like(&self) -> Self {
        Self::new(self.name.clone(), self.columns.clone())
    }

    /// Add a row, padding with nulls (or truncating) to the column count
    pub fn add_row(&mut self, mut cells: Vec<Value>) {
        cells.resize(self.columns.len(), Value::Null);
        self.rows.push(Row::new(cells));
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// A table with no rows or no columns holds no data
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Record views of all rows
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|row| Record {
            columns: &self.columns,
            row,
        })
    }

    /// Recompute each column's type from its values
    pub fn infer_column_types(&mut self) {
        for (col_idx, column) in self.columns.iter_mut().enumerate() {
            column.inferred_type = self
                .rows
                .iter()
                .filter_map(|row| row.get(col_idx))
                .fold(CellType::Null, |acc, cell| acc.widen(cell.cell_type()));
        }
    }
}
