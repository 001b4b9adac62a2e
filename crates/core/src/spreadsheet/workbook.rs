//! Workbook access on top of `umya-spreadsheet`.

use std::path::{Path, PathBuf};
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

use crate::pool::WorkItem;

use super::SpreadsheetError;

const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm"];

/// A data row with a non-empty identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    /// 1-based worksheet row.
    pub row: u32,
    /// Trimmed identifier.
    pub user_id: String,
}

impl WorkItem for UserRow {
    type Key = UserRow;

    fn key(&self) -> UserRow {
        self.clone()
    }
}

/// Rows selected from a worksheet.
#[derive(Debug, Clone, Default)]
pub struct UserRows {
    pub rows: Vec<UserRow>,
    /// Data rows dropped because the identifier cell was empty.
    pub blank: u64,
}

/// Checks that `path` is an existing workbook of a supported type.
pub fn validate_input(path: &Path) -> Result<(), SpreadsheetError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SpreadsheetError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(SpreadsheetError::Io(e)),
    };

    if metadata.is_dir() {
        return Err(SpreadsheetError::IsDirectory {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(SpreadsheetError::UnsupportedType {
            path: path.to_path_buf(),
            extension,
        });
    }

    Ok(())
}

/// Output path next to `input`: `<stem><suffix>.<ext>`.
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    input.with_file_name(file_name)
}

/// The first worksheet of a workbook, opened for enrichment.
pub struct UserSheet {
    book: Spreadsheet,
    path: PathBuf,
}

impl UserSheet {
    /// Opens and parses a workbook.
    pub fn open(path: &Path) -> Result<Self, SpreadsheetError> {
        validate_input(path)?;

        let book = reader::xlsx::read(path).map_err(|e| SpreadsheetError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let sheet = Self {
            book,
            path: path.to_path_buf(),
        };
        sheet.sheet()?;
        Ok(sheet)
    }

    fn sheet(&self) -> Result<&Worksheet, SpreadsheetError> {
        self.book
            .get_sheet(&0)
            .ok_or_else(|| SpreadsheetError::NoWorksheet {
                path: self.path.clone(),
            })
    }

    fn sheet_mut(&mut self) -> Result<&mut Worksheet, SpreadsheetError> {
        let path = self.path.clone();
        self.book
            .get_sheet_mut(&0)
            .ok_or(SpreadsheetError::NoWorksheet { path })
    }

    /// Name of the worksheet being processed.
    pub fn sheet_name(&self) -> Result<String, SpreadsheetError> {
        Ok(self.sheet()?.get_name().to_string())
    }

    /// Data rows (below the header) whose identifier cell is not blank.
    pub fn user_rows(&self, id_column: u32) -> Result<UserRows, SpreadsheetError> {
        if id_column == 0 {
            return Err(SpreadsheetError::InvalidColumn(id_column));
        }

        let sheet = self.sheet()?;
        let mut selected = UserRows::default();

        for row in 2..=sheet.get_highest_row() {
            let value = sheet.get_value((id_column, row));
            let user_id = value.trim();
            if user_id.is_empty() {
                selected.blank += 1;
                continue;
            }
            selected.rows.push(UserRow {
                row,
                user_id: user_id.to_string(),
            });
        }

        Ok(selected)
    }

    /// Column of the last non-empty header cell (0 when the header row is empty).
    pub fn header_width(&self) -> Result<u32, SpreadsheetError> {
        let sheet = self.sheet()?;
        let width = (1..=sheet.get_highest_column())
            .rev()
            .find(|column| !sheet.get_value((*column, 1)).trim().is_empty())
            .unwrap_or(0);
        Ok(width)
    }

    /// Writes `title` into the first free header cell and returns its column.
    pub fn add_result_column(&mut self, title: &str) -> Result<u32, SpreadsheetError> {
        let column = self.header_width()? + 1;
        self.set_value(column, 1, title)?;
        Ok(column)
    }

    /// Reads a cell as text.
    pub fn value(&self, column: u32, row: u32) -> Result<String, SpreadsheetError> {
        Ok(self.sheet()?.get_value((column, row)))
    }

    /// Writes a text cell.
    pub fn set_value(&mut self, column: u32, row: u32, value: &str) -> Result<(), SpreadsheetError> {
        self.sheet_mut()?
            .get_cell_mut((column, row))
            .set_value_string(value);
        Ok(())
    }

    /// Saves the workbook to `path`.
    pub fn save_as(&self, path: &Path) -> Result<(), SpreadsheetError> {
        writer::xlsx::write(&self.book, path).map_err(|e| SpreadsheetError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
