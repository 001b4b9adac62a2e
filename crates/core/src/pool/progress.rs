//! Periodic progress log lines for long-running pools.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::info;

use super::stats::RunStatistics;

/// Background task that logs a progress line every `interval`.
pub struct ProgressReporter {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// Starts reporting. The first line is logged one interval from now.
    ///
    /// An interval too large to schedule never logs.
    pub fn spawn(
        name: String,
        stats: Arc<RunStatistics>,
        interval: Duration,
        expected: Option<Arc<AtomicU64>>,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            let Some(first_tick) = started.checked_add(interval) else {
                let _ = stop_rx.await;
                return;
            };
            let mut ticker = interval_at(first_tick, interval);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => report(&name, &stats, started.elapsed(), expected.as_deref()),
                }
            }
        });

        Self {
            stop_tx: Some(stop_tx),
            handle,
        }
    }

    /// Stops the reporter and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

fn report(name: &str, stats: &RunStatistics, elapsed: Duration, expected: Option<&AtomicU64>) {
    let processed = stats.processed();
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 { processed as f64 / secs } else { 0.0 };
    let expected = expected
        .map(|n| n.load(Ordering::Relaxed).to_string())
        .unwrap_or_else(|| "?".to_string());

    info!(
        pool = name,
        "Progress ({:.0}s elapsed, {:.1} items/sec): processed {}/{}, succeeded {}, skipped {}, failed {}, in flight {}",
        secs,
        rate,
        processed,
        expected,
        stats.succeeded(),
        stats.skipped(),
        stats.failed(),
        stats.in_flight(),
    );
}
