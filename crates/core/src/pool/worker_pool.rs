//! Semaphore-bounded worker pool with a single-writer result funnel.

use futures::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, info, warn};

use crate::metrics;

use super::config::PoolConfig;
use super::progress::ProgressReporter;
use super::stats::RunStatistics;
use super::types::{Outcome, PoolSummary, ResultSink, WorkItem, WorkResult};
use super::PoolError;

/// What the dispatcher got while waiting for the next item.
enum Next<I> {
    Item(Option<I>),
    /// Shutdown flag changed; `false` means the sender is gone.
    Signal(bool),
}

/// A fixed-size pool of concurrent workers.
pub struct WorkerPool {
    name: String,
    concurrency: usize,
    stats: Arc<RunStatistics>,
    shutdown: Option<watch::Receiver<bool>>,
    progress_interval: Option<Duration>,
    expected: Option<Arc<AtomicU64>>,
}

impl WorkerPool {
    /// Creates a pool running at most `concurrency` operations at once.
    pub fn new(name: impl Into<String>, concurrency: usize) -> Result<Self, PoolError> {
        if concurrency == 0 {
            return Err(PoolError::InvalidConcurrency(concurrency));
        }

        Ok(Self {
            name: name.into(),
            concurrency,
            stats: Arc::new(RunStatistics::new()),
            shutdown: None,
            progress_interval: None,
            expected: None,
        })
    }

    /// Creates a pool from shared pool settings.
    pub fn from_config(name: impl Into<String>, config: &PoolConfig) -> Result<Self, PoolError> {
        Ok(Self::new(name, config.concurrency)?.with_progress_interval(config.progress_interval()))
    }

    /// Stops pulling new items once the flag turns `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Enables periodic progress log lines.
    pub fn with_progress_interval(mut self, interval: Option<Duration>) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Number of items the source is expected to yield, for progress lines.
    pub fn with_expected(self, expected: u64) -> Self {
        self.with_expected_counter(Arc::new(AtomicU64::new(expected)))
    }

    /// Like [`with_expected`](Self::with_expected) for sources that are
    /// still being enumerated while the pool runs.
    pub fn with_expected_counter(mut self, expected: Arc<AtomicU64>) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Live statistics, readable while `run` is in progress.
    pub fn stats(&self) -> Arc<RunStatistics> {
        Arc::clone(&self.stats)
    }

    /// Runs `operation` over every item and applies each result to `sink`.
    ///
    /// Returns after every dispatched item has produced its result.
    pub async fn run<S, I, T, F, Fut, K>(&self, items: S, operation: F, sink: &mut K) -> PoolSummary
    where
        S: Stream<Item = I>,
        I: WorkItem,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
        K: ResultSink<I::Key, T>,
    {
        let started = Instant::now();
        let (tx, mut rx) = mpsc::channel(self.concurrency * 2);
        let progress = self.progress_interval.map(|interval| {
            ProgressReporter::spawn(
                self.name.clone(),
                Arc::clone(&self.stats),
                interval,
                self.expected.clone(),
            )
        });

        debug!(pool = %self.name, concurrency = self.concurrency, "Worker pool started");

        let dispatch = self.dispatch(items, Arc::new(operation), tx);
        let drain = async {
            let mut completed = 0u64;
            while let Some(result) = rx.recv().await {
                sink.apply(result);
                completed += 1;
            }
            completed
        };
        let ((dispatched, interrupted), completed) = tokio::join!(dispatch, drain);

        if let Some(progress) = progress {
            progress.stop().await;
        }

        let summary = PoolSummary {
            dispatched,
            completed,
            interrupted,
            elapsed: started.elapsed(),
            stats: self.stats.snapshot(),
        };

        if dispatched != completed {
            warn!(
                pool = %self.name,
                dispatched,
                completed,
                "Result count does not match dispatched item count"
            );
        }
        debug!(pool = %self.name, dispatched, completed, "Worker pool drained");

        summary
    }

    /// Pulls items from the source and spawns one task per item.
    ///
    /// Returns the number of dispatched items and whether a shutdown request
    /// cut the source short. Dropping `tx` on return lets the drain finish
    /// once the last worker reports.
    async fn dispatch<S, I, T, F, Fut>(
        &self,
        items: S,
        operation: Arc<F>,
        tx: mpsc::Sender<WorkResult<I::Key, T>>,
    ) -> (u64, bool)
    where
        S: Stream<Item = I>,
        I: WorkItem,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut items = std::pin::pin!(items);
        let mut shutdown = self.shutdown.clone();
        let mut dispatched = 0u64;
        let mut interrupted = false;

        loop {
            if shutdown.as_ref().is_some_and(|rx| *rx.borrow()) {
                info!(pool = %self.name, dispatched, "Shutdown requested, no new items will be dispatched");
                interrupted = true;
                break;
            }

            let next = match shutdown.as_mut() {
                Some(rx) => tokio::select! {
                    biased;
                    changed = rx.changed() => Next::Signal(changed.is_ok()),
                    item = items.next() => Next::Item(item),
                },
                None => Next::Item(items.next().await),
            };

            let item = match next {
                Next::Item(Some(item)) => item,
                Next::Item(None) => break,
                Next::Signal(true) => continue,
                Next::Signal(false) => {
                    shutdown = None;
                    continue;
                }
            };

            let key = item.key();
            dispatched += 1;

            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                // The semaphore is owned here and never closed.
                self.stats.begin();
                let outcome = Outcome::failed("worker pool closed");
                self.stats.finish(&outcome);
                let _ = tx
                    .send(WorkResult {
                        key,
                        outcome,
                        elapsed: Duration::ZERO,
                    })
                    .await;
                break;
            };

            let operation = Arc::clone(&operation);
            let stats = Arc::clone(&self.stats);
            let tx = tx.clone();
            let pool = self.name.clone();

            tokio::spawn(async move {
                stats.begin();
                metrics::POOL_IN_FLIGHT.with_label_values(&[&pool]).inc();
                let started = Instant::now();

                let outcome = match AssertUnwindSafe(async move { operation(item).await })
                    .catch_unwind()
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(pool = %pool, "Worker panicked, recording item as failed");
                        Outcome::failed("worker panicked")
                    }
                };

                let elapsed = started.elapsed();
                stats.finish(&outcome);
                metrics::POOL_IN_FLIGHT.with_label_values(&[&pool]).dec();
                metrics::POOL_ITEMS
                    .with_label_values(&[&pool, outcome.label()])
                    .inc();
                metrics::POOL_ITEM_DURATION
                    .with_label_values(&[&pool])
                    .observe(elapsed.as_secs_f64());
                drop(permit);

                let _ = tx.send(WorkResult { key, outcome, elapsed }).await;
            });
        }

        (dispatched, interrupted)
    }
}
