//! Migration runner.

use chrono::NaiveDate;
use futures::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::pool::{Outcome, PoolConfig, PoolSummary, ResultSink, WorkResult, WorkerPool};

use super::config::MigrationConfig;
use super::copier::{CopyStatus, ObjectCopier};
use super::enumerator::{CopyJob, ObjectEnumerator, ScanSnapshot};
use super::filter::EligibilityFilter;
use super::MigrationError;

const POOL_NAME: &str = "migrate";

/// Jobs a run would copy, without touching the destination.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationPlan {
    pub cutoff: NaiveDate,
    pub jobs: Vec<PlannedCopy>,
    pub total_bytes: u64,
    pub scan: ScanSnapshot,
}

/// One entry of a [`MigrationPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCopy {
    pub key: String,
    pub date: NaiveDate,
    pub size: u64,
}

/// Outcome of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub cutoff: NaiveDate,
    pub scan: ScanSnapshot,
    pub summary: PoolSummary,
    pub copied: u64,
    pub already_present: u64,
    pub bytes_copied: u64,
    /// Keys that failed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Aggregates copy results.
#[derive(Debug, Default)]
pub struct CopyTally {
    pub copied: u64,
    pub already_present: u64,
    pub bytes_copied: u64,
    pub failed: Vec<(String, String)>,
}

impl ResultSink<ObjectPath, u64> for CopyTally {
    fn apply(&mut self, result: WorkResult<ObjectPath, u64>) {
        match result.outcome {
            Outcome::Succeeded(bytes) => {
                self.copied += 1;
                self.bytes_copied += bytes;
            }
            Outcome::Skipped { .. } => self.already_present += 1,
            Outcome::Failed { reason } => self.failed.push((result.key.to_string(), reason)),
        }
    }
}

/// Copies eligible objects from one store to another.
pub struct Migration {
    source: Arc<dyn ObjectStore>,
    destination: Arc<dyn ObjectStore>,
    config: MigrationConfig,
    pool: PoolConfig,
    cutoff: NaiveDate,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Migration {
    /// Fails when no cutoff date is configured.
    pub fn new(
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
        config: MigrationConfig,
        pool: PoolConfig,
    ) -> Result<Self, MigrationError> {
        let cutoff = config.cutoff()?;
        Ok(Self {
            source,
            destination,
            config,
            pool,
            cutoff,
            shutdown: None,
        })
    }

    /// Stops dispatching new copies once the flag turns `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn enumerator(&self) -> ObjectEnumerator {
        ObjectEnumerator::new(
            Arc::clone(&self.source),
            self.config.prefix.as_deref().map(ObjectPath::from),
            EligibilityFilter::from_config(&self.config, self.cutoff),
        )
    }

    /// Enumerates the source and returns what a run would copy.
    ///
    /// The destination is not checked, so objects already copied are listed too.
    pub async fn plan(&self) -> Result<MigrationPlan, MigrationError> {
        let enumerator = self.enumerator();
        let jobs: Vec<PlannedCopy> = enumerator
            .jobs()
            .map(|job| PlannedCopy {
                key: job.location.to_string(),
                date: job.date,
                size: job.size,
            })
            .collect()
            .await;

        let scan = enumerator.stats().snapshot();
        if let Some(reason) = scan.listing_error {
            return Err(MigrationError::Listing(reason));
        }

        let total_bytes = jobs.iter().map(|job| job.size).sum();
        info!(
            "Dry run: {} objects ({:.2} MB) dated on or after {} would be considered",
            jobs.len(),
            total_bytes as f64 / (1024.0 * 1024.0),
            self.cutoff
        );

        Ok(MigrationPlan {
            cutoff: self.cutoff,
            jobs,
            total_bytes,
            scan,
        })
    }

    /// Copies every eligible object that is missing at the destination.
    ///
    /// Copy failures are reported per key. A listing error is returned after
    /// in-flight copies have drained.
    pub async fn run(&self) -> Result<MigrationReport, MigrationError> {
        info!(
            "Starting migration (cutoff {}, {} workers)",
            self.cutoff, self.config.max_workers
        );

        let enumerator = self.enumerator();
        let scan_stats = enumerator.stats();

        let mut pool = WorkerPool::new(POOL_NAME, self.config.max_workers)?
            .with_progress_interval(self.pool.progress_interval())
            .with_expected_counter(scan_stats.queued_counter());
        if let Some(shutdown) = &self.shutdown {
            pool = pool.with_shutdown(shutdown.clone());
        }

        let copier = Arc::new(ObjectCopier::from_config(
            Arc::clone(&self.source),
            Arc::clone(&self.destination),
            &self.config,
        ));

        let mut tally = CopyTally::default();
        let summary = pool
            .run(
                enumerator.jobs(),
                move |job: CopyJob| {
                    let copier = Arc::clone(&copier);
                    async move {
                        match copier.copy(&job).await {
                            Ok(CopyStatus::Copied { bytes }) => Outcome::Succeeded(bytes),
                            Ok(CopyStatus::AlreadyPresent) => Outcome::skipped("already exists"),
                            Err(e) => {
                                warn!("{}", e);
                                Outcome::failed(e.to_string())
                            }
                        }
                    }
                },
                &mut tally,
            )
            .await;

        let scan = scan_stats.snapshot();
        let report = MigrationReport {
            cutoff: self.cutoff,
            scan,
            summary,
            copied: tally.copied,
            already_present: tally.already_present,
            bytes_copied: tally.bytes_copied,
            failed: tally.failed,
        };
        log_report(&report);

        if let Some(reason) = &report.scan.listing_error {
            return Err(MigrationError::Listing(reason.clone()));
        }
        Ok(report)
    }
}

fn log_report(report: &MigrationReport) {
    let scan = &report.scan;
    info!("{}", "=".repeat(60));
    info!("MIGRATION COMPLETE");
    info!("{}", "=".repeat(60));
    info!("Objects listed: {}", scan.listed);
    info!("Video files scanned: {}", scan.scanned);
    info!("Skipped (before {}): {}", report.cutoff, scan.before_cutoff);
    info!("Skipped (no date in path): {}", scan.undated);
    info!("Eligible files: {}", scan.queued);
    info!("Copied: {}", report.copied);
    info!("Already existed: {}", report.already_present);
    info!("Failed: {}", report.failed.len());
    info!(
        "Total data copied: {:.2} GB",
        report.bytes_copied as f64 / (1024.0 * 1024.0 * 1024.0)
    );
    info!(
        "Elapsed: {:.1}s ({:.2} objects/s)",
        report.summary.elapsed.as_secs_f64(),
        report.summary.rate()
    );
    if report.summary.interrupted {
        warn!("Migration was interrupted before every object was dispatched");
    }
    for (key, reason) in &report.failed {
        warn!("Failed: {} ({})", key, reason);
    }
    if let Some(reason) = &scan.listing_error {
        error!("Listing ended early: {}", reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::PutPayload;

    async fn seed(store: &InMemory, keys: &[&str]) {
        for key in keys {
            store
                .put(&ObjectPath::from(*key), PutPayload::from_static(b"video"))
                .await
                .unwrap();
        }
    }

    fn config(cutoff: &str) -> MigrationConfig {
        MigrationConfig {
            cutoff_date: Some(cutoff.parse().unwrap()),
            max_workers: 4,
            ..MigrationConfig::default()
        }
    }

    #[test]
    fn test_cutoff_is_required() {
        let err = Migration::new(
            Arc::new(InMemory::new()),
            Arc::new(InMemory::new()),
            MigrationConfig::default(),
            PoolConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, MigrationError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_plan_lists_without_copying() {
        let source = Arc::new(InMemory::new());
        let destination = Arc::new(InMemory::new());
        seed(
            &source,
            &["p1/2025-09-07/a.mp4", "p1/2025-09-06/b.mp4", "p1/2025-09-08/notes.txt"],
        )
        .await;

        let migration =
            Migration::new(source, destination.clone(), config("2025-09-07"), PoolConfig::default())
                .unwrap();
        let plan = migration.plan().await.unwrap();

        assert_eq!(plan.jobs.len(), 1);
        assert_eq!(plan.jobs[0].key, "p1/2025-09-07/a.mp4");
        assert_eq!(plan.total_bytes, 5);
        assert_eq!(plan.scan.before_cutoff, 1);
        assert_eq!(plan.scan.wrong_extension, 1);

        let listed: Vec<_> = destination.list(None).collect().await;
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_run_copies_then_skips() {
        let source = Arc::new(InMemory::new());
        let destination = Arc::new(InMemory::new());
        seed(&source, &["p1/2025-09-07/a.mp4", "p2/2025-09-09/b.MOV"]).await;

        let migration =
            Migration::new(source, destination, config("2025-09-07"), PoolConfig::default())
                .unwrap();

        let first = migration.run().await.unwrap();
        assert_eq!(first.copied, 2);
        assert_eq!(first.bytes_copied, 10);

        let second = migration.run().await.unwrap();
        assert_eq!(second.copied, 0);
        assert_eq!(second.already_present, 2);
        assert_eq!(second.bytes_copied, 0);
    }

    #[test]
    fn test_tally_records_failures() {
        let mut tally = CopyTally::default();
        tally.apply(WorkResult {
            key: ObjectPath::from("p/2025-09-08/a.mp4"),
            outcome: Outcome::failed("boom"),
            elapsed: std::time::Duration::ZERO,
        });
        tally.apply(WorkResult {
            key: ObjectPath::from("p/2025-09-08/b.mp4"),
            outcome: Outcome::Succeeded(7),
            elapsed: std::time::Duration::ZERO,
        });
        assert_eq!(tally.copied, 1);
        assert_eq!(tally.bytes_copied, 7);
        assert_eq!(tally.failed, vec![("p/2025-09-08/a.mp4".to_string(), "boom".to_string())]);
    }
}
