//! Prelude module - common imports for xlsx2csv users
//!
//! ```rust
//! use xlsx2csv::prelude::*;
//! ```

pub use crate::{
    convert,
    convert_reader,
    convert_with_options,
    // Cell types
    CellValue,
    ConvertError,
    ConvertStats,
    CsvWriteOptions,
    CsvWriter,
    LineTerminator,
    // Main types
    Workbook,
    Worksheet,
    XlsxReader,
};
