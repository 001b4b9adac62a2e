//! Configuration for worker pools.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shared worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of in-flight operations.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Seconds between progress log lines (0 disables progress reports).
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
}

fn default_concurrency() -> usize {
    10
}

fn default_progress_interval() -> u64 {
    10
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            progress_interval_secs: default_progress_interval(),
        }
    }
}

impl PoolConfig {
    /// Progress interval, `None` when reporting is disabled.
    pub fn progress_interval(&self) -> Option<Duration> {
        match self.progress_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
