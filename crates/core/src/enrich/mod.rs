//! Spreadsheet name enrichment.
//!
//! Reads user identifiers from a workbook, resolves each one through an
//! [`IdentityResolver`](crate::identity::IdentityResolver) on a bounded
//! worker pool and writes the names into a new column of a copy of the
//! workbook.

mod runner;
mod sink;

pub use runner::{EnrichmentReport, NameEnrichment};
pub use sink::NameColumnSink;

use thiserror::Error;

use crate::pool::PoolError;
use crate::spreadsheet::SpreadsheetError;

/// Fatal enrichment errors. Per-user failures are written as placeholders
/// and never show up here.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A blocking workbook task died.
    #[error("Workbook task failed: {0}")]
    Task(String),
}
