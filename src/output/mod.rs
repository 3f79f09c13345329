//! Output: value display, previews, workbook and archive export

mod archive;
mod display;
mod json;
mod preview;
mod terminal;
mod xlsx;

use anyhow::Result;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::config::OutputFormat;

pub use archive::{export_groups, zip_buffers, NamedBuffer};
pub use display::ValueFormatter;
pub use json::JsonOutput;
pub use preview::{json_records, CleanPreview, JsonRecord, Preview};
pub use terminal::TerminalOutput;
pub use xlsx::{plan_sheets, sheet_name, SheetChunk, TableWriter};

/// Trait for preview renderers
pub trait PreviewRenderer {
    /// Render a table preview
    fn render_preview(&self, preview: &Preview, writer: &mut dyn WriteColor) -> Result<()>;

    /// Render a cleaning preview
    fn render_clean_preview(&self, preview: &CleanPreview, writer: &mut dyn WriteColor) -> Result<()>;
}

/// Factory for creating preview renderers
pub struct OutputFactory;

impl OutputFactory {
    /// Create a renderer based on format type
    pub fn create(format: OutputFormat) -> Box<dyn PreviewRenderer> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Stdout stream; colors only when writing to a terminal
pub fn stdout_stream(format: OutputFormat) -> StandardStream {
    let choice = match format {
        OutputFormat::Terminal if std::io::IsTerminal::is_terminal(&std::io::stdout()) => ColorChoice::Auto,
        _ => ColorChoice::Never,
    };
    StandardStream::stdout(choice)
}
