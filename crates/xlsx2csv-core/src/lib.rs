//! # xlsx2csv-core
//!
//! Core data structures for the xlsx2csv converter.
//!
//! This crate provides the types shared by the reader and the writer:
//! - [`CellValue`] - A computed cell value with a total text rendering
//! - [`CellAddress`] - A1-style cell addressing
//! - [`NumberFormat`] - Enough number-format knowledge to recognise dates
//! - [`Workbook`], [`Worksheet`] - The in-memory document
//!
//! ## Example
//!
//! ```rust
//! use xlsx2csv_core::{CellValue, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.set_value_at(0, 0, CellValue::text("Name")).unwrap();
//! sheet.set_value_at(1, 1, CellValue::Number(30.0)).unwrap();
//!
//! let rows: Vec<Vec<String>> = sheet
//!     .rows()
//!     .map(|row| row.iter().map(CellValue::to_text).collect())
//!     .collect();
//! assert_eq!(rows, vec![vec!["Name", ""], vec!["", "30"]]);
//! ```

pub mod cell;
pub mod error;
pub mod number_format;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::datetime::DateSystem;
pub use cell::{CellAddress, CellValue};
pub use error::{Error, Result};
pub use number_format::{FormatKind, NumberFormat};
pub use workbook::{SheetEntry, SheetKind, Workbook};
pub use worksheet::{Rows, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
