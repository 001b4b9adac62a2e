//! Spreadsheet input and output for the name enrichment job.
//!
//! Reads identifier rows from the first worksheet of an `.xlsx` workbook and
//! writes resolved values into a new trailing column. The result is always
//! saved to a new file next to the input.

mod config;
mod workbook;

pub use config::SpreadsheetConfig;
pub use workbook::{output_path, validate_input, UserRow, UserRows, UserSheet};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing a workbook. All of them are fatal
/// for a run.
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    /// Input file does not exist.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// Input path points at a directory.
    #[error("Path is a directory: {path}")]
    IsDirectory { path: PathBuf },

    /// Extension is not a supported workbook type.
    #[error("Unsupported file type {extension:?} for {path} (expected .xlsx or .xlsm)")]
    UnsupportedType { path: PathBuf, extension: String },

    /// Workbook could not be parsed.
    #[error("Failed to read workbook {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// Workbook could not be written.
    #[error("Failed to write workbook {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// Workbook has no worksheet.
    #[error("Workbook {path} has no worksheets")]
    NoWorksheet { path: PathBuf },

    /// Identifier column must be 1-based.
    #[error("Invalid identifier column: {0} (columns are 1-based)")]
    InvalidColumn(u32),

    /// I/O error while checking the input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
