//! CSV payload parser

use std::borrow::Cow;

use anyhow::{bail, Context, Result};
use encoding_rs::Encoding;
use tracing::debug;

use crate::config::EngineConfig;
use crate::model::{Table, Value};

use super::{normalize_headers, Parser, SheetSelection};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Cell contents read as missing values
const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

/// Parser for CSV payloads
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(
        &self,
        source: &str,
        bytes: &[u8],
        _sheets: SheetSelection,
        config: &EngineConfig,
    ) -> Result<Vec<Table>> {
        let text = decode(bytes, config.fallback_encoding)?;
        let table = parse_text(source, &text)?;

        if table.is_empty() {
            debug!(file = source, "CSV has no data rows, skipping");
            return Ok(Vec::new());
        }
        Ok(vec![table])
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("csv")
    }
}

/// Decode as UTF-8, retrying once with the fallback encoding
fn decode<'a>(bytes: &'a [u8], fallback: &'static Encoding) -> Result<Cow<'a, str>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(utf8_err) => {
            debug!(encoding = fallback.name(), "payload is not UTF-8, retrying");
            fallback
                .decode_without_bom_handling_and_without_replacement(bytes)
                .with_context(|| {
                    format!(
                        "Payload is neither UTF-8 ({}) nor {}",
                        utf8_err,
                        fallback.name()
                    )
                })
        }
    }
}

fn parse_text(source: &str, text: &str) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = csv_reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let columns = normalize_headers(headers.iter().map(str::to_string).collect());
    let width = columns.len();
    let mut table = Table::new(source, columns);

    for (line_num, result) in csv_reader.records().enumerate() {
        let line = line_num + 2; // 1-indexing plus header
        let record = result.with_context(|| format!("Failed to read CSV row {}", line))?;

        // Blank line
        if record.len() <= 1 && record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() > width {
            bail!(
                "Expected {} fields in line {}, saw {}",
                width,
                line,
                record.len()
            );
        }

        table.add_row(record.iter().map(parse_cell_value).collect());
    }

    table.infer_column_types();
    Ok(table)
}

/// Parse a field into a Value with type inference. Text keeps its
/// original spacing; booleans and numbers are recognised after trimming.
/// Date-like text stays text.
fn parse_cell_value(s: &str) -> Value {
    if NULL_MARKERS.contains(&s) {
        return Value::Null;
    }

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Value::Text(s.to_string());
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::Float(f);
    }

    Value::Text(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    fn parse(bytes: &[u8]) -> Result<Vec<Table>> {
        CsvParser.parse("t.csv", bytes, SheetSelection::All, &EngineConfig::default())
    }

    #[test]
    fn test_parse_cell_value() {
        assert_eq!(parse_cell_value(""), Value::Null);
        assert_eq!(parse_cell_value("NA"), Value::Null);
        assert_eq!(parse_cell_value("null"), Value::Null);
        assert_eq!(parse_cell_value("true"), Value::Bool(true));
        assert_eq!(parse_cell_value("FALSE"), Value::Bool(false));
        assert_eq!(parse_cell_value("42"), Value::Int(42));
        assert_eq!(parse_cell_value(" 42 "), Value::Int(42));
        assert_eq!(parse_cell_value("3.5"), Value::Float(3.5));
        assert_eq!(parse_cell_value("  hi "), Value::Text("  hi ".into()));
        assert_eq!(parse_cell_value("   "), Value::Text("   ".into()));
    }

    #[test]
    fn test_date_like_text_is_kept_verbatim() {
        let tables = parse(
            b"when\n2024-03-01 00:00:00\n2024-03-01\n2024/03/01\n2024-03-01T09:30:15\n",
        )
        .unwrap();
        let cells: Vec<_> = tables[0].rows.iter().map(|r| r.cells[0].clone()).collect();
        assert_eq!(
            cells,
            vec![
                Value::from("2024-03-01 00:00:00"),
                Value::from("2024-03-01"),
                Value::from("2024/03/01"),
                Value::from("2024-03-01T09:30:15"),
            ]
        );
        assert_eq!(tables[0].columns[0].inferred_type, CellType::Text);
    }

    #[test]
    fn test_parse_table() {
        let tables = parse(b"id,name,score\n1,Ann,3.5\n2,,4\n3,Bob\n").unwrap();
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.column_names(), vec!["id", "name", "score"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[1].cells[1], Value::Null);
        assert_eq!(table.rows[2].cells[2], Value::Null);
        assert_eq!(table.columns[0].inferred_type, CellType::Int);
        assert_eq!(table.columns[1].inferred_type, CellType::Text);
        assert_eq!(table.columns[2].inferred_type, CellType::Float);
    }

    #[test]
    fn test_numeric_headers_become_text() {
        let tables = parse(b"2023,2024\n1,2\n").unwrap();
        assert_eq!(tables[0].column_names(), vec!["2023", "2024"]);
    }

    #[test]
    fn test_header_only_is_skipped() {
        assert!(parse(b"id,name\n").unwrap().is_empty());
        assert!(parse(b"").unwrap().is_empty());
    }

    #[test]
    fn test_wide_row_is_an_error() {
        let err = parse(b"a,b\n1,2,3\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let tables = parse(b"\xEF\xBB\xBFid\n1\n").unwrap();
        assert_eq!(tables[0].column_names(), vec!["id"]);
    }

    #[test]
    fn test_gbk_fallback() {
        let (bytes, _, _) = encoding_rs::GBK.encode("名称,数量\n苹果,3\n");
        assert!(std::str::from_utf8(&bytes).is_err());
        let tables = parse(&bytes).unwrap();
        assert_eq!(tables[0].column_names(), vec!["名称", "数量"]);
        assert_eq!(tables[0].rows[0].cells[0], Value::Text("苹果".into()));
    }

    #[test]
    fn test_undecodable_payload_fails() {
        // 0xFF is invalid in both UTF-8 and GBK
        let err = parse(b"id\n\xFF\xFF\n").unwrap_err();
        assert!(format!("{:#}", err).contains("GBK"));
    }
}
