//! Request-scoped operations.
//!
//! Each function runs a fresh loader → transform → output pipeline over the
//! payloads it is given and shares nothing with other calls. Multi-file
//! operations read every sheet; single-file operations read only the first.

use tracing::{info, info_span};

use crate::clean::{CleanOptions, Cleaner};
use crate::config::{EngineConfig, MergeMode};
use crate::error::Result;
use crate::group::Grouper;
use crate::merge::Merger;
use crate::model::Table;
use crate::output::{export_groups, CleanPreview, NamedBuffer, Preview, TableWriter};
use crate::parser::{SourceLoader, Upload};

/// Merge every table of every upload into one
pub fn merge(uploads: &[Upload], mode: MergeMode, config: &EngineConfig) -> Result<Table> {
    let _span = info_span!("merge", files = uploads.len(), %mode).entered();
    let tables = SourceLoader::new().load_batch(uploads, config)?;
    info!(tables = tables.len(), "loaded uploads");
    Merger::new(mode).merge(tables)
}

/// Merge and serialize the result as a workbook
pub fn merge_export(uploads: &[Upload], mode: MergeMode, config: &EngineConfig) -> Result<Vec<u8>> {
    let merged = merge(uploads, mode, config)?;
    TableWriter::new(config).write(&merged)
}

/// Merge and return the leading rows. `rows` defaults to the configured
/// preview size.
pub fn merge_preview(
    uploads: &[Upload],
    mode: MergeMode,
    rows: Option<usize>,
    config: &EngineConfig,
) -> Result<Preview> {
    let merged = merge(uploads, mode, config)?;
    Ok(Preview::from_table(
        &merged,
        rows.unwrap_or(config.merge_preview_rows),
    ))
}

/// Column names of the upload's first table
pub fn list_columns(upload: &Upload, config: &EngineConfig) -> Result<Vec<String>> {
    let table = SourceLoader::new().load_first(upload, config)?;
    Ok(table.column_names())
}

/// Partition the upload's first table by `column` and export one workbook
/// per group
pub fn split(upload: &Upload, column: &str, config: &EngineConfig) -> Result<Vec<NamedBuffer>> {
    let _span = info_span!("split", file = %upload.filename, column).entered();
    let table = SourceLoader::new().load_first(upload, config)?;
    let groups = Grouper::new(column).group(table)?;
    let files = export_groups(&groups, config)?;
    info!(groups = files.len(), "split table");
    Ok(files)
}

/// Clean the upload's first table and report the change in shape
pub fn clean_preview(
    upload: &Upload,
    options: CleanOptions,
    rows: Option<usize>,
    config: &EngineConfig,
) -> Result<CleanPreview> {
    let _span = info_span!("clean_preview", file = %upload.filename).entered();
    let table = SourceLoader::new().load_first(upload, config)?;
    let (cleaned, stats) = Cleaner::new(options).clean(table);
    info!(
        rows_removed = stats.rows_removed(),
        cols_removed = stats.cols_removed(),
        "cleaned table"
    );
    Ok(CleanPreview::new(
        &cleaned,
        stats,
        &options,
        rows.unwrap_or(config.clean_preview_rows),
    ))
}

/// Clean the upload's first table and serialize it as a workbook
pub fn clean_export(upload: &Upload, options: CleanOptions, config: &EngineConfig) -> Result<Vec<u8>> {
    let _span = info_span!("clean_export", file = %upload.filename).entered();
    let table = SourceLoader::new().load_first(upload, config)?;
    let (cleaned, stats) = Cleaner::new(options).clean(table);
    info!(
        rows = stats.cleaned_rows,
        cols = stats.cleaned_cols,
        "cleaned table"
    );
    TableWriter::new(config).write(&cleaned)
}
