//! Parser layer: turns uploaded payloads into logical tables

mod csv;
mod excel;

use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::model::{Column, Table};

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;

/// A named byte payload, as received from an upload
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, bytes })
    }
}

/// Which sheets of a workbook to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSelection {
    /// Every sheet, one table per non-empty sheet
    All,
    /// Only the first sheet
    First,
}

/// Trait for parsing tabular payloads
pub trait Parser: Send + Sync {
    /// Parse a payload into zero or more non-empty tables
    fn parse(
        &self,
        source: &str,
        bytes: &[u8],
        sheets: SheetSelection,
        config: &EngineConfig,
    ) -> anyhow::Result<Vec<Table>>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Dispatches payloads to parsers by file extension
pub struct SourceLoader {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLoader {
    /// Create a loader with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(CsvParser), Box::new(ExcelParser)],
        }
    }

    /// Get a parser for the given file name
    pub fn get_parser(&self, filename: &str) -> Option<&dyn Parser> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        self.parsers
            .iter()
            .find(|p| p.supports_extension(&ext))
            .map(|p| p.as_ref())
    }

    /// Load one payload. Unsupported file types yield no tables.
    pub fn load(
        &self,
        upload: &Upload,
        sheets: SheetSelection,
        config: &EngineConfig,
    ) -> Result<Vec<Table>> {
        let Some(parser) = self.get_parser(&upload.filename) else {
            warn!(file = %upload.filename, "unsupported file type, skipping");
            return Ok(Vec::new());
        };

        let tables = parser
            .parse(&upload.filename, &upload.bytes, sheets, config)
            .map_err(|e| {
                warn!(file = %upload.filename, error = %format!("{:#}", e), "failed to parse file");
                EngineError::unparseable(&upload.filename, &e)
            })?;

        debug!(file = %upload.filename, tables = tables.len(), "loaded payload");
        Ok(tables)
    }

    /// Load a batch of payloads, stopping at the first one that fails
    pub fn load_batch(&self, uploads: &[Upload], config: &EngineConfig) -> Result<Vec<Table>> {
        let mut tables = Vec::new();
        for upload in uploads {
            tables.extend(self.load(upload, SheetSelection::All, config)?);
        }

        if tables.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        Ok(tables)
    }

    /// Load the first sheet (or the CSV table) of a single payload
    pub fn load_first(&self, upload: &Upload, config: &EngineConfig) -> Result<Table> {
        self.load(upload, SheetSelection::First, config)?
            .into_iter()
            .next()
            .ok_or(EngineError::EmptyInput)
    }
}

/// Build unique column definitions from raw header text.
///
/// Blank headers become `Unnamed: {index}`; repeats get `.1`, `.2`, ...
pub(crate) fn normalize_headers(raw: Vec<String>) -> Vec<Column> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let base = if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            };
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            Column::new(candidate)
        })
        .collect()
}
