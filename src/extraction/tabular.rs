//! CSV and spreadsheet flattening.
//!
//! The first row of a table is its header and is not emitted. Every remaining row becomes its
//! cells joined by single spaces, and rows are joined by single spaces as well.

use calamine::{Data, Reader};
use std::io::Cursor;

use super::ExtractionError;

/// Flatten a CSV file. Ragged rows are accepted; empty input yields empty text.
pub(crate) fn extract_csv(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(join_cells(record.iter().map(str::to_string)));
    }
    Ok(rows.join(" "))
}

/// Flatten the first worksheet of an `.xls`/`.xlsx` workbook.
pub(crate) fn extract_spreadsheet(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(String::new());
    };
    let range = range?;

    let rows: Vec<String> = range
        .rows()
        .skip(1)
        .map(|row| join_cells(row.iter().map(cell_text)))
        .collect();
    Ok(rows.join(" "))
}

fn join_cells(cells: impl Iterator<Item = String>) -> String {
    cells.collect::<Vec<_>>().join(" ")
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::Error(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Ledger" sheetId="1" r:id="rId1"/><sheet name="Notes" sheetId="2" r:id="rId2"/></sheets></workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/></Relationships>"#;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    /// Header row, a numeric row, and a row with an empty middle cell.
    const LEDGER_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1:C3"/><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>item</t></is></c><c r="B1" t="inlineStr"><is><t>amount</t></is></c><c r="C1" t="inlineStr"><is><t>note</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>rent</t></is></c><c r="B2"><v>1200</v></c><c r="C2" t="inlineStr"><is><t>monthly</t></is></c></row><row r="3"><c r="A3" t="inlineStr"><is><t>deposit</t></is></c><c r="C3" t="inlineStr"><is><t>once</t></is></c></row></sheetData></worksheet>"#;

    const NOTES_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1:A2"/><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>heading</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>second sheet text</t></is></c></row></sheetData></worksheet>"#;

    fn build_xlsx() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, body) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", LEDGER_SHEET),
            ("xl/worksheets/sheet2.xml", NOTES_SHEET),
        ] {
            writer.start_file(name, options).expect("start entry");
            writer.write_all(body.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish xlsx").into_inner()
    }

    #[test]
    fn first_worksheet_rows_flatten_without_header() {
        let text = extract_spreadsheet(&build_xlsx()).expect("xlsx");
        assert_eq!(text, "rent 1200 monthly deposit  once");
        assert!(!text.contains("item"));
        assert!(!text.contains("second sheet"));
    }

    #[test]
    fn csv_rows_flatten_without_header() {
        let text = extract_csv(b"name,score\nada,10\ngrace,12\n").expect("csv");
        assert_eq!(text, "ada 10 grace 12");
    }

    #[test]
    fn csv_accepts_ragged_rows_and_quotes() {
        let text = extract_csv(b"a,b,c\n1,\"two, three\"\n4,5,6,7\n").expect("csv");
        assert_eq!(text, "1 two, three 4 5 6 7");
    }

    #[test]
    fn empty_or_header_only_csv_is_empty_text() {
        assert_eq!(extract_csv(b"").expect("csv"), "");
        assert_eq!(extract_csv(b"only,header\n").expect("csv"), "");
    }

    #[test]
    fn csv_with_invalid_utf8_is_an_error() {
        let result = extract_csv(b"h1,h2\n\xff\xfe,ok\n");
        assert!(matches!(result, Err(ExtractionError::Csv(_))));
    }

    #[test]
    fn garbage_spreadsheet_is_an_error() {
        let result = extract_spreadsheet(b"definitely not a workbook");
        assert!(matches!(result, Err(ExtractionError::Spreadsheet(_))));
    }

    #[test]
    fn spreadsheet_cells_are_string_coerced() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
        assert_eq!(cell_text(&Data::String("cell".into())), "cell");
    }
}
