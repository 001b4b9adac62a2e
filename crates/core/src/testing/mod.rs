//! Testing utilities and mock implementations.
//!
//! This module provides a mock identity resolver, a failure-injecting object
//! store and fixture helpers so the pipelines can be exercised without network
//! access.
//!
//! # Example
//!
//! ```rust,ignore
//! use opsbatch_core::testing::{fixtures, MockIdentityResolver};
//!
//! let resolver = MockIdentityResolver::new();
//! resolver.set_name("user_1", "Ada Lovelace").await;
//!
//! fixtures::write_workbook(&path, &[&["Email", "", "", "", "User ID"], &["a@x", "", "", "", "user_1"]])?;
//! ```

mod faulty_store;
mod mock_identity;

pub use faulty_store::FaultyStore;
pub use mock_identity::MockIdentityResolver;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::identity::{IdentityEmail, IdentityUser};
    use crate::spreadsheet::SpreadsheetError;

    /// Create an identity API user record.
    pub fn user(first: Option<&str>, last: Option<&str>, emails: &[&str]) -> IdentityUser {
        IdentityUser {
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            username: None,
            email_addresses: Some(
                emails
                    .iter()
                    .map(|e| IdentityEmail {
                        email_address: Some(e.to_string()),
                    })
                    .collect(),
            ),
        }
    }

    /// Write a single-sheet workbook; empty strings leave the cell blank.
    pub fn write_workbook(path: &Path, rows: &[&[&str]]) -> Result<(), SpreadsheetError> {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| SpreadsheetError::NoWorksheet {
                path: path.to_path_buf(),
            })?;
        for (r, cells) in rows.iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                if !value.is_empty() {
                    sheet
                        .get_cell_mut((c as u32 + 1, r as u32 + 1))
                        .set_value_string(*value);
                }
            }
        }
        umya_spreadsheet::writer::xlsx::write(&book, path).map_err(|e| SpreadsheetError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
