//! Configuration handling for excelab

use encoding_rs::Encoding;

/// Column reconciliation policy used when merging several tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Keep every column seen in any table
    #[default]
    Union,
    /// Keep only the columns shared by all tables
    Intersection,
}

impl std::str::FromStr for MergeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "union" | "outer" => Ok(MergeMode::Union),
            "intersection" | "inner" => Ok(MergeMode::Intersection),
            _ => Err(format!("Unknown merge mode: {}", s)),
        }
    }
}

impl std::fmt::Display for MergeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeMode::Union => write!(f, "union"),
            MergeMode::Intersection => write!(f, "intersection"),
        }
    }
}

/// Output format for previews
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Engine-wide settings, built once per process and shared by reference
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Rows per exported sheet before the writer starts a new one
    pub max_rows_per_sheet: usize,
    /// Base name of exported sheets
    pub sheet_name: String,
    /// Encoding tried for CSV payloads that are not valid UTF-8
    pub fallback_encoding: &'static Encoding,
    /// Rows returned by a merge preview
    pub merge_preview_rows: usize,
    /// Rows returned by a clean preview
    pub clean_preview_rows: usize,
    /// Maximum characters of a group key kept in split file names
    pub group_name_max_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rows_per_sheet: 1_000_000,
            sheet_name: "Merged_Data".to_string(),
            fallback_encoding: encoding_rs::GBK,
            merge_preview_rows: 10,
            clean_preview_rows: 5,
            group_name_max_chars: 50,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-sheet row threshold
    pub fn with_max_rows_per_sheet(mut self, rows: usize) -> Self {
        self.max_rows_per_sheet = rows.max(1);
        self
    }

    /// Set the exported sheet base name
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Set the CSV fallback encoding
    pub fn with_fallback_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.fallback_encoding = encoding;
        self
    }

    /// Set the number of rows in a merge preview
    pub fn with_merge_preview_rows(mut self, rows: usize) -> Self {
        self.merge_preview_rows = rows;
        self
    }

    /// Set the number of rows in a clean preview
    pub fn with_clean_preview_rows(mut self, rows: usize) -> Self {
        self.clean_preview_rows = rows;
        self
    }

    /// Set the group name truncation length for split exports
    pub fn with_group_name_max_chars(mut self, chars: usize) -> Self {
        self.group_name_max_chars = chars;
        self
    }
}
