//! Configuration for the downloader.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `yt-dlp` invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Directory downloads are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Format selector passed with `-f`.
    #[serde(default = "default_format")]
    pub format: String,

    /// Output file name template, relative to `output_dir`.
    #[serde(default = "default_output_template")]
    pub output_template: String,

    /// Additional arguments placed before the URL.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Timeout for a single download in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Parallel downloads.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_format() -> String {
    "bestvideo+bestaudio/best".to_string()
}

fn default_output_template() -> String {
    "%(title)s [%(id)s].%(ext)s".to_string()
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_concurrency() -> usize {
    2
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            output_dir: default_output_dir(),
            format: default_format(),
            output_template: default_output_template(),
            extra_args: Vec::new(),
            timeout_secs: default_timeout(),
            concurrency: default_concurrency(),
        }
    }
}
