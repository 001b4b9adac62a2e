//! Bounded worker pool for per-item remote operations.
//!
//! The pool pulls work items from a lazy source, runs at most `concurrency`
//! operations at the same time and funnels every outcome through a single
//! channel into a caller-owned [`ResultSink`]. Every dispatched item yields
//! exactly one [`WorkResult`], including items whose operation panicked.
//!
//! # Example
//!
//! ```ignore
//! use opsbatch_core::pool::{Outcome, WorkerPool};
//!
//! let pool = WorkerPool::new("resolve", 10)?;
//! let summary = pool
//!     .run(futures::stream::iter(rows), |row| async move {
//!         match resolver.resolve(&row.user_id).await {
//!             Ok(name) => Outcome::Succeeded(name),
//!             Err(e) => Outcome::failed(e.to_string()),
//!         }
//!     }, &mut sink)
//!     .await;
//! assert_eq!(summary.dispatched, summary.completed);
//! ```

mod config;
mod progress;
mod stats;
mod types;
mod worker_pool;

pub use config::PoolConfig;
pub use progress::ProgressReporter;
pub use stats::{RunStatistics, StatsSnapshot};
pub use types::{Outcome, PoolSummary, ResultSink, WorkItem, WorkResult};
pub use worker_pool::WorkerPool;

use thiserror::Error;

/// Errors raised while setting up a pool. Per-item failures never surface here.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The concurrency limit must be a positive integer.
    #[error("Invalid concurrency limit: {0} (must be at least 1)")]
    InvalidConcurrency(usize),
}
