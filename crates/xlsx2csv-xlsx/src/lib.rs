//! # xlsx2csv-xlsx
//!
//! Read-only XLSX (Office Open XML) reader for xlsx2csv.
//!
//! The reader only loads what a conversion needs: the sheet list, the active
//! sheet, shared strings, and the number formats that mark a number as a
//! date. Formula cells yield their cached result, never the formula text.

pub mod error;
pub mod reader;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
