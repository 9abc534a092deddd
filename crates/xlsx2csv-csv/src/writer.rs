//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::debug;

use crate::error::CsvResult;
use crate::options::{CsvWriteOptions, LineTerminator};
use xlsx2csv_core::{CellValue, Worksheet};

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write a worksheet to a CSV file, replacing any existing file
    pub fn write_file<P: AsRef<Path>>(
        worksheet: &Worksheet,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<usize> {
        let file = File::create(path)?;
        Self::write_worksheet(worksheet, file, options)
    }

    /// Write every row of a worksheet to a writer
    pub fn write_worksheet<W: Write>(
        worksheet: &Worksheet,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<usize> {
        Self::write_rows(worksheet.rows(), writer, options)
    }

    /// Write rows of cell values as CSV records, returning the record count
    ///
    /// Each cell is rendered with [`CellValue::to_text`]. Fields are quoted
    /// only when they contain the delimiter, the quote character or a line
    /// break; embedded quotes are doubled. The writer is flushed before
    /// returning.
    pub fn write_rows<I, W>(rows: I, writer: W, options: &CsvWriteOptions) -> CsvResult<usize>
    where
        I: IntoIterator<Item = Vec<CellValue>>,
        W: Write,
    {
        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator)
            .quote_style(csv::QuoteStyle::Necessary)
            .double_quote(true)
            .flexible(true)
            .from_writer(writer);

        let mut count = 0;
        for row in rows {
            csv_writer.write_record(row.iter().map(CellValue::to_text))?;
            count += 1;
        }

        csv_writer.flush()?;
        debug!("wrote {} CSV record(s)", count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn to_csv(rows: Vec<Vec<CellValue>>, options: &CsvWriteOptions) -> String {
        let mut out = Vec::new();
        CsvWriter::write_rows(rows, &mut out, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_rows_crlf() {
        let rows = vec![
            vec!["Name".into(), "Age".into()],
            vec!["Ann".into(), CellValue::Number(30.0)],
            vec!["Bo".into(), CellValue::Empty],
        ];
        assert_eq!(
            to_csv(rows, &CsvWriteOptions::default()),
            "Name,Age\r\nAnn,30\r\nBo,\r\n"
        );
    }

    #[test]
    fn test_lf_terminator() {
        let options = CsvWriteOptions {
            line_terminator: LineTerminator::LF,
            ..Default::default()
        };
        let rows = vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into()]];
        assert_eq!(to_csv(rows, &options), "a,b\nc,d\n");
    }

    #[test]
    fn test_quoting() {
        let rows = vec![vec![
            "a,b".into(),
            "say \"hi\"".into(),
            "two\nlines".into(),
            "cr\rhere".into(),
            "plain".into(),
        ]];
        assert_eq!(
            to_csv(rows, &CsvWriteOptions::default()),
            "\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\",\"cr\rhere\",plain\r\n"
        );
    }

    #[test]
    fn test_empty_cells_are_never_dropped() {
        let rows = vec![vec![CellValue::Empty, "x".into(), CellValue::Empty]];
        assert_eq!(to_csv(rows, &CsvWriteOptions::default()), ",x,\r\n");

        let rows = vec![vec![CellValue::Empty, CellValue::Empty]];
        assert_eq!(to_csv(rows, &CsvWriteOptions::default()), ",\r\n");
    }

    #[test]
    fn test_typed_values_use_text_rendering() {
        let rows = vec![vec![
            CellValue::Boolean(true),
            CellValue::Number(2.5),
            CellValue::Error("#N/A".into()),
        ]];
        assert_eq!(
            to_csv(rows, &CsvWriteOptions::default()),
            "TRUE,2.5,#N/A\r\n"
        );
    }

    #[test]
    fn test_record_count() {
        let rows = vec![vec![CellValue::Number(1.0)]; 4];
        let count = CsvWriter::write_rows(rows, std::io::sink(), &CsvWriteOptions::default())
            .unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_write_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale contents that are longer than the new output\n").unwrap();

        let mut sheet = Worksheet::new("S");
        sheet.set_value_at(0, 0, "fresh").unwrap();
        let count = CsvWriter::write_file(&sheet, &path, &CsvWriteOptions::default()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\r\n");
    }

    #[test]
    fn test_write_file_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.csv");
        let err = CsvWriter::write_file(&Worksheet::new("S"), &path, &CsvWriteOptions::default())
            .unwrap_err();
        assert!(err.io_error().is_some());
    }
}
