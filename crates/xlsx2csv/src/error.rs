//! Conversion error types

use std::path::PathBuf;

use thiserror::Error;
use xlsx2csv_csv::CsvError;
use xlsx2csv_xlsx::XlsxError;

/// Result type for conversions
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

/// Errors that can occur while converting a workbook to CSV
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input workbook could not be opened or parsed
    #[error("Failed to open '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    /// An in-memory workbook could not be parsed
    #[error("Failed to read workbook: {0}")]
    Read(#[source] XlsxError),

    /// The workbook has no active sheet that can be converted
    #[error("No active sheet: {0}")]
    NoActiveSheet(#[source] xlsx2csv_core::Error),

    /// The output file could not be created or written
    #[error("Failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: CsvError,
    },

    /// Writing CSV to a caller-supplied writer failed
    #[error("Failed to write CSV: {0}")]
    Output(#[source] CsvError),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl ConvertError {
    pub(crate) fn write<P: Into<PathBuf>, E: Into<CsvError>>(path: P, source: E) -> Self {
        ConvertError::Write {
            path: path.into(),
            source: source.into(),
        }
    }
}
