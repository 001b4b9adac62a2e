//! Configuration for spreadsheet enrichment.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadsheetConfig {
    /// 1-based column holding the user identifier.
    #[serde(default = "default_id_column")]
    pub id_column: u32,

    /// Header written above the resolved names.
    #[serde(default = "default_header")]
    pub header: String,

    /// Appended to the input file stem to build the output path.
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

fn default_id_column() -> u32 {
    5
}

fn default_header() -> String {
    "User Name".to_string()
}

fn default_output_suffix() -> String {
    "_updated".to_string()
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            header: default_header(),
            output_suffix: default_output_suffix(),
        }
    }
}
