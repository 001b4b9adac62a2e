//! Types shared by every pool consumer.

use serde::Serialize;
use std::time::Duration;

use super::stats::StatsSnapshot;

/// One unit of input handed to a worker.
///
/// The key carries whatever the aggregator needs to place the result
/// (a row number, an object key). It is captured before the item moves
/// into the operation so a result can always be attributed.
pub trait WorkItem: Send + 'static {
    type Key: Clone + Send + 'static;

    fn key(&self) -> Self::Key;
}

/// Outcome of a single remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation completed and produced a payload.
    Succeeded(T),
    /// The operation decided there was nothing to do.
    Skipped { reason: String },
    /// The operation failed; the cause is human readable.
    Failed { reason: String },
}

impl<T> Outcome<T> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => "succeeded",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// The result of processing one work item.
#[derive(Debug, Clone)]
pub struct WorkResult<K, T> {
    pub key: K,
    pub outcome: Outcome<T>,
    /// Wall time spent in the operation.
    pub elapsed: Duration,
}

/// Single writer for results.
///
/// The pool calls `apply` from the task that called [`super::WorkerPool::run`],
/// one result at a time, in completion order.
pub trait ResultSink<K, T> {
    fn apply(&mut self, result: WorkResult<K, T>);
}

/// Sink that keeps every result, mostly useful in tests and small batches.
impl<K, T> ResultSink<K, T> for Vec<WorkResult<K, T>> {
    fn apply(&mut self, result: WorkResult<K, T>) {
        self.push(result);
    }
}

/// Summary returned once the pool has drained.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    /// Items handed to a worker.
    pub dispatched: u64,
    /// Results applied to the sink.
    pub completed: u64,
    /// True when a shutdown request stopped dispatching early.
    pub interrupted: bool,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    pub stats: StatsSnapshot,
}

impl PoolSummary {
    /// Items per second over the whole run.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}
