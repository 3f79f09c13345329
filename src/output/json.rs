//! JSON output format

use anyhow::Result;
use serde::Serialize;
use termcolor::WriteColor;

use super::preview::{CleanPreview, Preview};
use super::PreviewRenderer;

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    fn write_value<T: Serialize>(&self, value: &T, writer: &mut dyn WriteColor) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, value)?;
        } else {
            serde_json::to_writer(&mut *writer, value)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewRenderer for JsonOutput {
    fn render_preview(&self, preview: &Preview, writer: &mut dyn WriteColor) -> Result<()> {
        self.write_value(preview, writer)
    }

    fn render_clean_preview(&self, preview: &CleanPreview, writer: &mut dyn WriteColor) -> Result<()> {
        self.write_value(preview, writer)
    }
}
