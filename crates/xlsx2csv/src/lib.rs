//! # xlsx2csv
//!
//! Convert the active sheet of an XLSX workbook into a CSV file.
//!
//! Cells are read in their computed form: formulas contribute their cached
//! result, absent cells become empty fields, and every row is padded to the
//! sheet's width so field counts never shrink.
//!
//! ## Example
//!
//! ```no_run
//! use xlsx2csv::prelude::*;
//!
//! match convert("input.xlsx", "output.csv") {
//!     Ok(stats) => println!("wrote {} rows", stats.rows),
//!     Err(e) => eprintln!("ERROR: {}", e),
//! }
//! ```

pub mod convert;
pub mod error;
pub mod prelude;

pub use convert::{convert, convert_reader, convert_with_options, ConvertStats};
pub use error::{ConvertError, ConvertResult};

// Re-export core types
pub use xlsx2csv_core::{
    CellAddress, CellValue, DateSystem, Error, FormatKind, NumberFormat, Result, SheetEntry,
    SheetKind, Workbook, Worksheet,
};

// Re-export XLSX types
pub use xlsx2csv_xlsx::{XlsxError, XlsxReader, XlsxResult};

// Re-export CSV types
pub use xlsx2csv_csv::{CsvError, CsvResult, CsvWriteOptions, CsvWriter, LineTerminator};
