//! Run statistics shared between workers and the progress reporter.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::Outcome;

/// Monotonic counters updated once per work item.
///
/// Workers write, the progress reporter reads while the run is going
/// (values may lag slightly), the final summary reads after the drain.
#[derive(Debug, Default)]
pub struct RunStatistics {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an operation as started.
    pub(crate) fn begin(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
    }

    /// Marks an operation as finished with the given outcome.
    pub(crate) fn finish<T>(&self, outcome: &Outcome<T>) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        let counter = match outcome {
            Outcome::Succeeded(_) => &self.succeeded,
            Outcome::Skipped { .. } => &self.skipped,
            Outcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of simultaneous operations seen so far.
    pub fn peak_in_flight(&self) -> u64 {
        self.peak_in_flight.load(Ordering::Acquire)
    }

    /// Items that produced an outcome.
    pub fn processed(&self) -> u64 {
        self.succeeded() + self.skipped() + self.failed()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            attempted: self.attempted(),
            succeeded: self.succeeded(),
            skipped: self.skipped(),
            failed: self.failed(),
            peak_in_flight: self.peak_in_flight(),
        }
    }
}

/// Point-in-time copy of [`RunStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub attempted: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub peak_in_flight: u64,
}

impl StatsSnapshot {
    pub fn processed(&self) -> u64 {
        self.succeeded + self.skipped + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_finish_tracks_peak() {
        let stats = RunStatistics::new();
        stats.begin();
        stats.begin();
        assert_eq!(stats.in_flight(), 2);
        stats.finish(&Outcome::Succeeded(()));
        stats.begin();
        stats.finish(&Outcome::<()>::skipped("exists"));
        stats.finish(&Outcome::<()>::failed("timeout"));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.attempted, 3);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.skipped, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.peak_in_flight, 2);
        assert_eq!(snapshot.processed(), 3);
        assert_eq!(stats.in_flight(), 0);
    }
}
