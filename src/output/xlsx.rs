//! Workbook export with fixed-size sheet chunking

use std::borrow::Cow;
use std::ops::Range;

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{Table, Value};

use super::display::ValueFormatter;

/// Excel's limit on sheet name length
const MAX_SHEET_NAME_CHARS: usize = 31;

/// Excel's limit on characters in one cell
const MAX_CELL_CHARS: usize = 32_767;

/// Largest integer an Excel number cell holds exactly
const MAX_EXACT_INT: u64 = 1 << 53;

/// One output sheet and the table rows it receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetChunk {
    pub name: String,
    pub rows: Range<usize>,
}

/// Lay out `row_count` rows over sheets of at most `max_rows` rows.
///
/// Up to the threshold a single sheet named `base` is used; beyond it,
/// sheets are named `base_1`, `base_2`, ...
pub fn plan_sheets(row_count: usize, max_rows: usize, base: &str) -> Vec<SheetChunk> {
    let max_rows = max_rows.max(1);
    if row_count <= max_rows {
        return vec![SheetChunk {
            name: sheet_name(base, ""),
            rows: 0..row_count,
        }];
    }

    (0..row_count.div_ceil(max_rows))
        .map(|i| SheetChunk {
            name: sheet_name(base, &format!("_{}", i + 1)),
            rows: i * max_rows..((i + 1) * max_rows).min(row_count),
        })
        .collect()
}

/// Make a sheet name Excel accepts, keeping `suffix` intact
pub fn sheet_name(base: &str, suffix: &str) -> String {
    let room = MAX_SHEET_NAME_CHARS.saturating_sub(suffix.chars().count());
    let cleaned: String = base
        .chars()
        .map(|c| {
            if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') {
                '_'
            } else {
                c
            }
        })
        .take(room)
        .collect();
    let cleaned = cleaned.trim_matches('\'');

    // "History" is reserved by Excel
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("history") {
        format!("Sheet{}", suffix)
    } else {
        format!("{}{}", cleaned, suffix)
    }
}

/// Serializes tables into xlsx workbooks
pub struct TableWriter<'a> {
    config: &'a EngineConfig,
}

impl<'a> TableWriter<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Write a table using the configured sheet name
    pub fn write(&self, table: &Table) -> Result<Vec<u8>> {
        self.write_named(table, &self.config.sheet_name)
    }

    /// Write a table with `sheet_base` as the sheet name (or name prefix
    /// when chunked)
    pub fn write_named(&self, table: &Table, sheet_base: &str) -> Result<Vec<u8>> {
        let chunks = plan_sheets(table.row_count(), self.config.max_rows_per_sheet, sheet_base);
        let mut workbook = Workbook::new();

        for chunk in &chunks {
            let worksheet = workbook.add_worksheet().set_name(&chunk.name)?;
            write_header(worksheet, table)?;
            for (offset, row) in table.rows[chunk.rows.clone()].iter().enumerate() {
                let row_num = excel_row(offset + 1)?;
                for (col, value) in row.cells.iter().enumerate() {
                    write_cell(worksheet, row_num, excel_col(col)?, value)?;
                }
            }
        }

        debug!(
            table = %table.name,
            rows = table.row_count(),
            sheets = chunks.len(),
            "wrote workbook"
        );
        Ok(workbook.save_to_buffer()?)
    }
}

fn excel_row(index: usize) -> std::result::Result<u32, XlsxError> {
    u32::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

fn excel_col(index: usize) -> std::result::Result<u16, XlsxError> {
    u16::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

fn write_header(worksheet: &mut Worksheet, table: &Table) -> std::result::Result<(), XlsxError> {
    for (col, column) in table.columns.iter().enumerate() {
        worksheet.write_string(0, excel_col(col)?, fit_cell_text(Cow::Borrowed(&column.name)))?;
    }
    Ok(())
}

/// Numbers and booleans stay native; everything else is written in its
/// display form. Nulls leave the cell blank.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
) -> std::result::Result<(), XlsxError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Value::Int(i) if i.unsigned_abs() <= MAX_EXACT_INT => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Value::Float(f) if f.is_finite() => {
            worksheet.write_number(row, col, *f)?;
        }
        other => {
            worksheet.write_string(row, col, fit_cell_text(ValueFormatter::display(other)))?;
        }
    }
    Ok(())
}

/// Truncate text to what one Excel cell can hold
fn fit_cell_text(text: Cow<'_, str>) -> Cow<'_, str> {
    let cut = text.char_indices().nth(MAX_CELL_CHARS).map(|(i, _)| i);
    match cut {
        Some(cut) => {
            warn!(
                chars = text.chars().count(),
                limit = MAX_CELL_CHARS,
                "cell text exceeds Excel's limit, truncating"
            );
            Cow::Owned(text[..cut].to_string())
        }
        None => text,
    }
}
