//! Result sink writing resolved names into the workbook.

use tracing::warn;

use crate::identity::unknown_user_label;
use crate::pool::{Outcome, ResultSink, WorkResult};
use crate::spreadsheet::{UserRow, UserSheet};

/// Writes one cell per result into the result column.
///
/// Failed lookups get the `Unknown User (<id>)` placeholder.
pub struct NameColumnSink<'a> {
    sheet: &'a mut UserSheet,
    column: u32,
    resolved: u64,
    placeholders: u64,
    write_errors: u64,
}

impl<'a> NameColumnSink<'a> {
    pub fn new(sheet: &'a mut UserSheet, column: u32) -> Self {
        Self {
            sheet,
            column,
            resolved: 0,
            placeholders: 0,
            write_errors: 0,
        }
    }

    pub fn resolved(&self) -> u64 {
        self.resolved
    }

    pub fn placeholders(&self) -> u64 {
        self.placeholders
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }
}

impl ResultSink<UserRow, String> for NameColumnSink<'_> {
    fn apply(&mut self, result: WorkResult<UserRow, String>) {
        let value = match result.outcome {
            Outcome::Succeeded(name) => {
                self.resolved += 1;
                name
            }
            Outcome::Skipped { .. } | Outcome::Failed { .. } => {
                self.placeholders += 1;
                unknown_user_label(&result.key.user_id)
            }
        };

        if let Err(e) = self.sheet.set_value(self.column, result.key.row, &value) {
            warn!("Failed to write row {}: {}", result.key.row, e);
            self.write_errors += 1;
        }
    }
}
