//! Batch downloads through the worker pool.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::pool::{Outcome, PoolConfig, PoolSummary, ResultSink, WorkItem, WorkResult, WorkerPool};

use super::{DownloadError, VideoDownloader};

const POOL_NAME: &str = "download";

/// One URL from the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    /// 1-based line in the URL list.
    pub line: usize,
    pub url: String,
}

impl WorkItem for DownloadItem {
    type Key = DownloadItem;

    fn key(&self) -> DownloadItem {
        self.clone()
    }
}

/// Reads one URL per line, ignoring blank lines and `#` comments.
pub async fn read_url_list(path: &Path) -> Result<Vec<DownloadItem>, DownloadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DownloadError::UrlList {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let url = line.trim();
            if url.is_empty() || url.starts_with('#') {
                None
            } else {
                Some(DownloadItem {
                    line: i + 1,
                    url: url.to_string(),
                })
            }
        })
        .collect())
}

/// Counts download results.
#[derive(Debug, Default)]
pub struct DownloadTally {
    pub downloaded: u64,
    /// Failed URLs with the reason.
    pub failed: Vec<(String, String)>,
}

impl ResultSink<DownloadItem, ()> for DownloadTally {
    fn apply(&mut self, result: WorkResult<DownloadItem, ()>) {
        match result.outcome {
            Outcome::Succeeded(()) => self.downloaded += 1,
            Outcome::Skipped { .. } => {}
            Outcome::Failed { reason } => {
                warn!("Line {}: {} failed: {}", result.key.line, result.key.url, reason);
                self.failed.push((result.key.url, reason));
            }
        }
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub output_dir: PathBuf,
    pub downloaded: u64,
    pub failed: Vec<(String, String)>,
    pub summary: PoolSummary,
}

/// Downloads a list of URLs with bounded parallelism.
pub struct DownloadBatch {
    downloader: Arc<dyn VideoDownloader>,
    output_dir: PathBuf,
    concurrency: usize,
    pool: PoolConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl DownloadBatch {
    pub fn new(
        downloader: Arc<dyn VideoDownloader>,
        output_dir: impl Into<PathBuf>,
        concurrency: usize,
        pool: PoolConfig,
    ) -> Self {
        Self {
            downloader,
            output_dir: output_dir.into(),
            concurrency,
            pool,
            shutdown: None,
        }
    }

    /// Stops starting new downloads once the flag turns `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub async fn run(&self, items: Vec<DownloadItem>) -> Result<DownloadReport, DownloadError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| DownloadError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        info!(
            "Downloading {} URLs into {} with {} ({} at a time)",
            items.len(),
            self.output_dir.display(),
            self.downloader.name(),
            self.concurrency
        );

        let mut pool = WorkerPool::new(POOL_NAME, self.concurrency)?
            .with_progress_interval(self.pool.progress_interval())
            .with_expected(items.len() as u64);
        if let Some(shutdown) = &self.shutdown {
            pool = pool.with_shutdown(shutdown.clone());
        }

        let downloader = Arc::clone(&self.downloader);
        let mut tally = DownloadTally::default();
        let summary = pool
            .run(
                futures::stream::iter(items),
                move |item: DownloadItem| {
                    let downloader = Arc::clone(&downloader);
                    async move {
                        match downloader.download(&item.url).await {
                            Ok(_) => Outcome::Succeeded(()),
                            Err(e) => Outcome::failed(e.to_string()),
                        }
                    }
                },
                &mut tally,
            )
            .await;

        info!(
            "Downloads finished: {} succeeded, {} failed in {:.1}s",
            tally.downloaded,
            tally.failed.len(),
            summary.elapsed.as_secs_f64()
        );

        Ok(DownloadReport {
            output_dir: self.output_dir.clone(),
            downloaded: tally.downloaded,
            failed: tally.failed,
            summary,
        })
    }
}
