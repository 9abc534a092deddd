//! Records written by CsvWriter parse back to the same fields

use proptest::prelude::*;
use xlsx2csv_core::{CellValue, Worksheet};
use xlsx2csv_csv::{CsvWriteOptions, CsvWriter, LineTerminator};

fn parse(bytes: &[u8], options: &CsvWriteOptions) -> Vec<Vec<String>> {
    let terminator = match options.line_terminator {
        LineTerminator::LF => csv::Terminator::Any(b'\n'),
        LineTerminator::CRLF => csv::Terminator::CRLF,
    };
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .quote(options.quote)
        .terminator(terminator)
        .from_reader(bytes)
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_worksheet_with_gaps() {
    let mut sheet = Worksheet::new("Data");
    sheet.set_value_at(0, 0, "Name").unwrap();
    sheet.set_value_at(0, 1, "Age").unwrap();
    sheet.set_value_at(1, 0, "Ann").unwrap();
    sheet.set_value_at(1, 1, 30.0).unwrap();
    sheet.set_value_at(2, 0, "Bo").unwrap();

    let mut out = Vec::new();
    let count = CsvWriter::write_worksheet(&sheet, &mut out, &CsvWriteOptions::default()).unwrap();

    assert_eq!(count, 3);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Name,Age\r\nAnn,30\r\nBo,\r\n"
    );
}

#[test]
fn test_empty_worksheet_writes_nothing() {
    let mut out = Vec::new();
    let count =
        CsvWriter::write_worksheet(&Worksheet::new("Empty"), &mut out, &CsvWriteOptions::default())
            .unwrap();
    assert_eq!(count, 0);
    assert!(out.is_empty());
}

#[test]
fn test_custom_delimiter() {
    let options = CsvWriteOptions {
        delimiter: b';',
        ..Default::default()
    };
    let rows = vec![vec![CellValue::text("a;b"), CellValue::text("c,d")]];

    let mut out = Vec::new();
    CsvWriter::write_rows(rows, &mut out, &options).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "\"a;b\";c,d\r\n");
}

proptest! {
    #[test]
    fn prop_text_fields_survive(
        rows in prop::collection::vec(
            prop::collection::vec("[ -~\n\r]{0,12}", 1..6),
            1..8,
        )
    ) {
        let options = CsvWriteOptions::default();
        let cells: Vec<Vec<CellValue>> = rows
            .iter()
            .map(|row| row.iter().map(|s| CellValue::text(s.as_str())).collect())
            .collect();

        let mut out = Vec::new();
        let count = CsvWriter::write_rows(cells, &mut out, &options).unwrap();
        prop_assert_eq!(count, rows.len());

        let parsed = parse(&out, &options);
        prop_assert_eq!(parsed, rows);
    }
}
