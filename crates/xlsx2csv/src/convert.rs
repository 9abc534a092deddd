//! Active sheet to CSV conversion

use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use log::debug;

use crate::error::{ConvertError, ConvertResult};
use xlsx2csv_core::{Workbook, Worksheet};
use xlsx2csv_csv::{CsvWriteOptions, CsvWriter};
use xlsx2csv_xlsx::XlsxReader;

/// Summary of a finished conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertStats {
    /// Name of the sheet that was converted
    pub sheet_name: String,
    /// Number of CSV records written
    pub rows: usize,
    /// Number of fields in every record
    pub columns: usize,
}

impl ConvertStats {
    fn new(worksheet: &Worksheet, rows: usize) -> Self {
        Self {
            sheet_name: worksheet.name().to_string(),
            rows,
            columns: worksheet.extent().map_or(0, |(_, cols)| cols as usize),
        }
    }
}

/// Convert the active sheet of the workbook at `input` into a CSV file at `output`
///
/// The output is created, or truncated, only once the workbook has been
/// opened and its active sheet resolved. A failure to open the input
/// therefore never touches `output`.
///
/// # Example
///
/// ```no_run
/// let stats = xlsx2csv::convert("report.xlsx", "report.csv")?;
/// println!("{} rows from '{}'", stats.rows, stats.sheet_name);
/// # Ok::<(), xlsx2csv::ConvertError>(())
/// ```
pub fn convert<P, Q>(input: P, output: Q) -> ConvertResult<ConvertStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    convert_with_options(input, output, &CsvWriteOptions::default())
}

/// [`convert`] with explicit CSV options
pub fn convert_with_options<P, Q>(
    input: P,
    output: Q,
    options: &CsvWriteOptions,
) -> ConvertResult<ConvertStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref();
    let output = output.as_ref();

    let workbook = XlsxReader::read_file(input).map_err(|source| ConvertError::Open {
        path: input.to_path_buf(),
        source,
    })?;
    let worksheet = active_worksheet(&workbook)?;

    let file = File::create(output).map_err(|e| ConvertError::write(output, e))?;
    let mut writer = BufWriter::new(file);
    let rows = CsvWriter::write_worksheet(worksheet, &mut writer, options)
        .map_err(|e| ConvertError::write(output, e))?;
    writer.flush().map_err(|e| ConvertError::write(output, e))?;

    let stats = ConvertStats::new(worksheet, rows);
    debug!(
        "converted '{}' ({} x {}) from {} to {}",
        stats.sheet_name,
        stats.rows,
        stats.columns,
        input.display(),
        output.display()
    );
    Ok(stats)
}

/// Convert a workbook held in memory, writing CSV to `output`
pub fn convert_reader<R, W>(input: R, output: W) -> ConvertResult<ConvertStats>
where
    R: Read + Seek,
    W: Write,
{
    let workbook = XlsxReader::read(input).map_err(ConvertError::Read)?;
    let worksheet = active_worksheet(&workbook)?;

    let rows = CsvWriter::write_worksheet(worksheet, output, &CsvWriteOptions::default())
        .map_err(ConvertError::Output)?;

    let stats = ConvertStats::new(worksheet, rows);
    debug!(
        "converted '{}' ({} x {})",
        stats.sheet_name, stats.rows, stats.columns
    );
    Ok(stats)
}

fn active_worksheet(workbook: &Workbook) -> ConvertResult<&Worksheet> {
    workbook.active_worksheet().map_err(|e| match e {
        xlsx2csv_core::Error::Other(msg) => ConvertError::Other(msg),
        e => ConvertError::NoActiveSheet(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use xlsx2csv_core::{SheetEntry, SheetKind};
    use xlsx2csv_xlsx::fixture::{FixtureCell, XlsxFixture};

    #[test]
    fn test_convert_reader_spec_rows() {
        let bytes = XlsxFixture::new()
            .sheet(
                "People",
                vec![
                    vec![FixtureCell::text("Name"), FixtureCell::text("Age")],
                    vec![FixtureCell::text("Ann"), FixtureCell::number(30.0)],
                    vec![FixtureCell::text("Bo"), FixtureCell::Absent],
                ],
            )
            .build()
            .unwrap();

        let mut out = Vec::new();
        let stats = convert_reader(Cursor::new(bytes), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Name,Age\r\nAnn,30\r\nBo,\r\n");
        assert_eq!(
            stats,
            ConvertStats {
                sheet_name: "People".into(),
                rows: 3,
                columns: 2,
            }
        );
    }

    #[test]
    fn test_convert_reader_renamed_shared_strings_part() {
        let bytes = XlsxFixture::new()
            .shared_strings_part_name("SharedStrings.xml")
            .sheet("S", vec![vec![FixtureCell::text("kept")]])
            .build()
            .unwrap();

        let mut out = Vec::new();
        convert_reader(Cursor::new(bytes), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "kept\r\n");
    }

    #[test]
    fn test_unloaded_active_worksheet_is_other() {
        let mut workbook = Workbook::empty();
        workbook.push_sheet(SheetEntry {
            name: "Lazy".into(),
            kind: SheetKind::Worksheet,
            worksheet: None,
        });

        let err = active_worksheet(&workbook).unwrap_err();
        assert!(matches!(err, ConvertError::Other(_)));
        assert_eq!(err.to_string(), "Active sheet 'Lazy' was not loaded");
    }

    #[test]
    fn test_missing_sheets_are_no_active_sheet() {
        let err = active_worksheet(&Workbook::empty()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::NoActiveSheet(xlsx2csv_core::Error::NoSheets)
        ));
    }

    #[test]
    fn test_convert_reader_rejects_garbage() {
        let err = convert_reader(Cursor::new(b"not a workbook".to_vec()), Vec::new()).unwrap_err();
        assert!(matches!(err, ConvertError::Read(_)));
    }

    #[test]
    fn test_convert_reader_chartsheet_active() {
        let bytes = XlsxFixture::new()
            .sheet("Data", vec![vec![FixtureCell::number(1.0)]])
            .chartsheet("Chart")
            .active(1)
            .build()
            .unwrap();

        let err = convert_reader(Cursor::new(bytes), Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::NoActiveSheet(xlsx2csv_core::Error::NotAWorksheet(ref name)) if name == "Chart"
        ));
    }
}
