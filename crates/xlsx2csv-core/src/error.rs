//! Error types for xlsx2csv-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in xlsx2csv-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u16),

    /// The workbook contains no sheets at all
    #[error("Workbook contains no sheets")]
    NoSheets,

    /// The recorded active sheet index does not name a sheet
    #[error("Active sheet index {0} out of bounds (count: {1})")]
    ActiveSheetOutOfRange(usize, usize),

    /// The active sheet is a chartsheet or dialogsheet
    #[error("Active sheet '{0}' is not a worksheet")]
    NotAWorksheet(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
