//! Batch wrapper around the `yt-dlp` command-line downloader.
//!
//! Reads a list of URLs and runs one `yt-dlp` process per URL through the
//! worker pool, so a handful of downloads proceed side by side.

mod config;
mod runner;
mod ytdlp;

pub use config::DownloaderConfig;
pub use runner::{read_url_list, DownloadBatch, DownloadItem, DownloadReport, DownloadTally};
pub use ytdlp::YtDlpDownloader;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::pool::PoolError;

/// Errors from the downloader.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The downloader binary is not on PATH.
    #[error("Downloader binary not found: {binary}")]
    BinaryNotFound { binary: PathBuf },

    /// The process could not be started or awaited.
    #[error("Failed to run downloader: {0}")]
    Process(#[from] std::io::Error),

    /// The process exited unsuccessfully.
    #[error("Download of {url} failed (exit code {code:?}): {stderr}")]
    Exited {
        url: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The process ran past the configured timeout and was killed.
    #[error("Download of {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The URL list could not be read.
    #[error("Failed to read URL list {path}: {source}")]
    UrlList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Something that fetches a single URL to disk.
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    fn name(&self) -> &str;

    /// Downloads `url`, returning the wall time spent.
    async fn download(&self, url: &str) -> Result<Duration, DownloadError>;
}
