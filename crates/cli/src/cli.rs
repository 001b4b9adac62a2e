use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Batch operations: spreadsheet name resolution, object store migration
/// and video downloads.
#[derive(Debug, Parser)]
#[command(name = "opsbatch", version)]
pub struct Cli {
    /// Configuration file (defaults to ./opsbatch.toml when present)
    #[arg(long, global = true, env = "OPSBATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the concurrency limit of the selected command
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Write Prometheus metrics in text format to this file after the run
    #[arg(long, global = true)]
    pub metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a column of display names to a workbook of user IDs
    ResolveNames {
        /// Workbook to read (.xlsx or .xlsm)
        file: PathBuf,
    },
    /// Copy dated video objects from the source store to the destination store
    Migrate {
        /// List eligible objects without copying anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Download every URL listed in a file with yt-dlp
    Download {
        /// Text file with one URL per line
        url_file: PathBuf,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResolveNames { .. } => "resolve-names",
            Self::Migrate { .. } => "migrate",
            Self::Download { .. } => "download",
        }
    }
}
