//! `yt-dlp` process wrapper.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::metrics;

use super::config::DownloaderConfig;
use super::{DownloadError, VideoDownloader};

/// Lines of stderr kept for error messages.
const STDERR_TAIL: usize = 5;

/// Runs one `yt-dlp` process per URL.
pub struct YtDlpDownloader {
    config: DownloaderConfig,
}

impl YtDlpDownloader {
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    /// Arguments for downloading `url`.
    pub fn build_args(&self, url: &str) -> Vec<String> {
        let template = self.config.output_dir.join(&self.config.output_template);

        let mut args = vec![
            "-f".to_string(),
            self.config.format.clone(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            "--no-progress".to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.push(url.to_string());
        args
    }

    async fn run_process(&self, url: &str) -> Result<Duration, DownloadError> {
        let args = self.build_args(url);
        debug!("Running {} {}", self.config.binary.display(), args.join(" "));

        let started = Instant::now();
        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DownloadError::BinaryNotFound {
                        binary: self.config.binary.clone(),
                    }
                } else {
                    DownloadError::Process(e)
                }
            })?;

        let stderr = child.stderr.take();
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("yt-dlp: {}", line);
                    if tail.len() == STDERR_TAIL {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            child.wait().await
        })
        .await;

        match result {
            Ok(Ok(status)) if status.success() => Ok(started.elapsed()),
            Ok(Ok(status)) => Err(DownloadError::Exited {
                url: url.to_string(),
                code: status.code(),
                stderr: tail.into_iter().collect::<Vec<_>>().join("\n"),
            }),
            Ok(Err(e)) => Err(DownloadError::Process(e)),
            Err(_) => {
                let _ = child.kill().await;
                Err(DownloadError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.config.timeout_secs,
                })
            }
        }
    }
}

#[async_trait]
impl VideoDownloader for YtDlpDownloader {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn download(&self, url: &str) -> Result<Duration, DownloadError> {
        info!("Downloading {}", url);
        let started = Instant::now();
        let result = self.run_process(url).await;

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&["yt-dlp", "download", status])
            .inc();
        metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["yt-dlp", "download"])
            .observe(started.elapsed().as_secs_f64());

        if let Ok(elapsed) = &result {
            info!("Downloaded {} in {:.1}s", url, elapsed.as_secs_f64());
        }
        result
    }
}
