//! Serializable preview payloads

use serde::Serialize;
use serde_json::Map;

use crate::clean::{CleanOptions, CleanStats};
use crate::model::Table;

use super::display::ValueFormatter;

/// One row keyed by column name, in column order
pub type JsonRecord = Map<String, serde_json::Value>;

/// Head of a table plus its full row count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub data: Vec<JsonRecord>,
    pub total_rows: usize,
}

impl Preview {
    /// Preview of at most `rows` leading rows
    pub fn from_table(table: &Table, rows: usize) -> Self {
        Self {
            columns: table.column_names(),
            data: json_records(table, rows),
            total_rows: table.row_count(),
        }
    }
}

/// Before/after shape of a cleaning run and the head of its result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanPreview {
    pub original_rows: usize,
    pub original_cols: usize,
    pub cleaned_rows: usize,
    pub cleaned_cols: usize,
    pub preview_columns: Vec<String>,
    pub preview_data: Vec<JsonRecord>,
    pub actions: Vec<String>,
}

impl CleanPreview {
    pub fn new(cleaned: &Table, stats: CleanStats, options: &CleanOptions, rows: usize) -> Self {
        Self {
            original_rows: stats.original_rows,
            original_cols: stats.original_cols,
            cleaned_rows: stats.cleaned_rows,
            cleaned_cols: stats.cleaned_cols,
            preview_columns: cleaned.column_names(),
            preview_data: json_records(cleaned, rows),
            actions: options.actions().into_iter().map(str::to_string).collect(),
        }
    }
}

/// First `limit` rows as JSON objects with display-canonical values
pub fn json_records(table: &Table, limit: usize) -> Vec<JsonRecord> {
    table
        .records()
        .take(limit)
        .map(|record| {
            record
                .iter()
                .map(|(name, value)| (name.to_string(), ValueFormatter::json(value)))
                .collect()
        })
        .collect()
}
