//! Excel workbook parser (xlsx, xls, xlsm, ods)

use std::io::Cursor;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::config::EngineConfig;
use crate::model::{Table, Value};
use crate::output::ValueFormatter;

use super::{normalize_headers, Parser, SheetSelection};

/// Parser for Excel workbooks
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(
        &self,
        source: &str,
        bytes: &[u8],
        sheets: SheetSelection,
        _config: &EngineConfig,
    ) -> Result<Vec<Table>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .with_context(|| format!("Failed to open workbook: {}", source))?;

        let mut sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            bail!("No sheets found in workbook");
        }
        if sheets == SheetSelection::First {
            sheet_names.truncate(1);
        }

        let mut tables = Vec::new();
        for sheet_name in sheet_names {
            let range: Range<Data> = workbook
                .worksheet_range(&sheet_name)
                .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

            let table = parse_range(format!("{}:{}", source, sheet_name), &range);
            if table.is_empty() {
                debug!(file = source, sheet = %sheet_name, "sheet has no data rows, skipping");
                continue;
            }
            tables.push(table);
        }

        Ok(tables)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "xlsm" | "ods")
    }
}

fn parse_range(name: String, range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    // First row is header
    let Some(header_row) = rows.next() else {
        return Table::new(name, Vec::new());
    };
    let headers = header_row
        .iter()
        .map(|cell| ValueFormatter::display(&convert_cell(cell)).into_owned())
        .collect();

    let mut table = Table::new(name, normalize_headers(headers));
    for row in rows {
        table.add_row(row.iter().map(convert_cell).collect());
    }

    table.infer_column_types();
    table
}

fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => {
            // Check if it's actually an integer
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Value::Int(*f as i64)
            } else {
                Value::Float(*f)
            }
        }
        Data::Int(i) => Value::Int(*i),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                Value::Text(dt.as_f64().to_string())
            } else {
                match excel_datetime(dt) {
                    Some(datetime) => Value::DateTime(datetime),
                    None => Value::Float(dt.as_f64()),
                }
            }
        }
        Data::DateTimeIso(s) => parse_iso(s).map_or_else(|| Value::Text(s.clone()), Value::DateTime),
        Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => Value::Text(format!("#{:?}", e)),
    }
}

/// The date carried by time-only cells
fn time_only_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1900, 1, 1)
}

/// Date cell under the workbook's date system (1900 or 1904). Serials
/// below one day hold only a time of day.
fn excel_datetime(dt: &ExcelDateTime) -> Option<NaiveDateTime> {
    let datetime = dt.as_datetime()?;
    if (0.0..1.0).contains(&dt.as_f64()) {
        return time_only_date().map(|d| d.and_time(datetime.time()));
    }
    Some(datetime)
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S%.f") {
        return time_only_date().map(|d| d.and_time(t));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;
    use rust_xlsxwriter::{Format, Workbook};

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn workbook_bytes() -> Vec<u8> {
        let mut workbook = Workbook::new();

        let people = workbook.add_worksheet().set_name("People").unwrap();
        people.write_string(0, 0, "id").unwrap();
        people.write_string(0, 1, "name").unwrap();
        people.write_number(1, 0, 1.0).unwrap();
        people.write_string(1, 1, "Ann").unwrap();
        people.write_number(2, 0, 2.0).unwrap();
        people.write_string(2, 1, "Bob").unwrap();

        // Header only: skipped
        let empty = workbook.add_worksheet().set_name("Empty").unwrap();
        empty.write_string(0, 0, "id").unwrap();

        let scores = workbook.add_worksheet().set_name("Scores").unwrap();
        scores.write_number(0, 0, 2024.0).unwrap();
        scores.write_string(0, 1, "").unwrap();
        scores.write_number(1, 0, 1.5).unwrap();
        scores.write_boolean(1, 1, true).unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_all_sheets_are_loaded() {
        let bytes = workbook_bytes();
        let tables = ExcelParser
            .parse("book.xlsx", &bytes, SheetSelection::All, &EngineConfig::default())
            .unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "book.xlsx:People");
        assert_eq!(tables[0].column_names(), vec!["id", "name"]);
        assert_eq!(tables[0].rows[1].cells, vec![Value::Int(2), Value::from("Bob")]);
        assert_eq!(tables[0].columns[0].inferred_type, CellType::Int);

        assert_eq!(tables[1].name, "book.xlsx:Scores");
        assert_eq!(tables[1].column_names(), vec!["2024", "Unnamed: 1"]);
        assert_eq!(tables[1].rows[0].cells, vec![Value::Float(1.5), Value::Bool(true)]);
    }

    #[test]
    fn test_first_sheet_only() {
        let bytes = workbook_bytes();
        let tables = ExcelParser
            .parse("book.xlsx", &bytes, SheetSelection::First, &EngineConfig::default())
            .unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "book.xlsx:People");
    }

    #[test]
    fn test_garbage_is_an_error() {
        let result = ExcelParser.parse(
            "book.xlsx",
            b"not a workbook",
            SheetSelection::All,
            &EngineConfig::default(),
        );
        assert!(result.is_err());
    }

    fn load_single(bytes: &[u8]) -> Table {
        ExcelParser
            .parse("dates.xlsx", bytes, SheetSelection::First, &EngineConfig::default())
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_date_cells_1900_system() {
        let date = Format::new().set_num_format("yyyy-mm-dd");
        let time = Format::new().set_num_format("hh:mm");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "when").unwrap();
        sheet.write_number_with_format(1, 0, 45352.0, &date).unwrap();
        sheet.write_number_with_format(2, 0, 45352.5, &date).unwrap();
        // 14:05 is 845 minutes into the day
        sheet.write_number_with_format(3, 0, 845.0 / 1440.0, &time).unwrap();
        let table = load_single(&workbook.save_to_buffer().unwrap());

        let cells: Vec<_> = table.rows.iter().map(|r| r.cells[0].clone()).collect();
        assert_eq!(
            cells,
            vec![
                Value::DateTime(ymd_hms(2024, 3, 1, 0, 0, 0)),
                Value::DateTime(ymd_hms(2024, 3, 1, 12, 0, 0)),
                Value::DateTime(ymd_hms(1900, 1, 1, 14, 5, 0)),
            ]
        );
        assert_eq!(ValueFormatter::display(&cells[2]), "14:05");
    }

    /// Minimal xlsx package flagged `date1904` with one date cell
    fn workbook_1904(serial: f64) -> Vec<u8> {
        const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
        const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
        const PKG_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#.to_string(),
            ),
            (
                "_rels/.rels",
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#),
            ),
            (
                "xl/workbook.xml",
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><workbookPr date1904="1"/><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_NS}"><Relationship Id="rId1" Type="{REL_NS}/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{REL_NS}/styles" Target="styles.xml"/></Relationships>"#),
            ),
            (
                "xl/styles.xml",
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="{MAIN_NS}"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/></cellXfs></styleSheet>"#),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{MAIN_NS}"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>when</t></is></c></row><row r="2"><c r="A2" s="1"><v>{serial}</v></c></row></sheetData></worksheet>"#),
            ),
        ];

        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in parts {
            zip.start_file(name, zip::write::SimpleFileOptions::default())
                .unwrap();
            std::io::Write::write_all(&mut zip, content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_date_cells_1904_system() {
        // 43890 days after 1904-01-01
        let table = load_single(&workbook_1904(43890.0));
        assert_eq!(table.rows[0].cells[0], Value::DateTime(ymd_hms(2024, 3, 1, 0, 0, 0)));
    }

    #[test]
    fn test_iso_cells() {
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-03-01T09:30:15".into())),
            Value::DateTime(ymd_hms(2024, 3, 1, 9, 30, 15))
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("14:05:00".into())),
            Value::DateTime(ymd_hms(1900, 1, 1, 14, 5, 0))
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("someday".into())),
            Value::from("someday")
        );
    }
}
