//! Colored terminal output

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorSpec, WriteColor};

use super::preview::{CleanPreview, JsonRecord, Preview};
use super::PreviewRenderer;

/// Terminal output with colors
pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        Self
    }

    fn write_heading(&self, text: &str, writer: &mut dyn WriteColor) -> Result<()> {
        writer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(writer, "{}", text)?;
        writer.reset()?;
        Ok(())
    }

    fn write_count(&self, label: &str, before: usize, after: usize, writer: &mut dyn WriteColor) -> Result<()> {
        write!(writer, "{:<9}{} → {}", label, before, after)?;
        let removed = before.saturating_sub(after);
        if removed > 0 {
            writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            write!(writer, " (-{})", removed)?;
            writer.reset()?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_grid(&self, columns: &[String], data: &[JsonRecord], writer: &mut dyn WriteColor) -> Result<()> {
        if columns.is_empty() {
            writeln!(writer, "(no columns)")?;
            return Ok(());
        }
        writeln!(writer, "{}", build_table(columns, data))?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewRenderer for TerminalOutput {
    fn render_preview(&self, preview: &Preview, writer: &mut dyn WriteColor) -> Result<()> {
        self.write_heading(
            &format!(
                "Preview: {} of {} rows, {} columns",
                preview.data.len(),
                preview.total_rows,
                preview.columns.len()
            ),
            writer,
        )?;
        self.write_grid(&preview.columns, &preview.data, writer)
    }

    fn render_clean_preview(&self, preview: &CleanPreview, writer: &mut dyn WriteColor) -> Result<()> {
        self.write_heading("Clean preview", writer)?;
        self.write_count("Rows:", preview.original_rows, preview.cleaned_rows, writer)?;
        self.write_count("Columns:", preview.original_cols, preview.cleaned_cols, writer)?;
        if preview.actions.is_empty() {
            writeln!(writer, "Actions: none")?;
        } else {
            writeln!(writer, "Actions: {}", preview.actions.join(", "))?;
        }
        writeln!(writer)?;
        self.write_grid(&preview.preview_columns, &preview.preview_data, writer)
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build a formatted table from preview records
fn build_table(columns: &[String], data: &[JsonRecord]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for record in data {
        builder.push_record(
            columns
                .iter()
                .map(|c| record.get(c).map(cell_text).unwrap_or_default()),
        );
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}
