//! excelab - Merge, clean and split spreadsheet data
//!
//! Loads CSV and workbook payloads into logical tables, reconciles and merges
//! them, removes empty rows and columns, partitions by a column, and writes
//! the results back out as xlsx workbooks.

pub mod clean;
pub mod config;
pub mod error;
pub mod group;
pub mod merge;
pub mod model;
pub mod output;
pub mod parser;
pub mod pipeline;

pub use clean::{CleanOptions, CleanStats};
pub use config::{EngineConfig, MergeMode, OutputFormat};
pub use error::{EngineError, ErrorKind, Result};
pub use model::{Table, Value};
pub use parser::Upload;
