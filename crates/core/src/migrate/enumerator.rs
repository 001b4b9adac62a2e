//! Lazy enumeration of eligible source objects.

use futures::{future, Stream, StreamExt};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::metrics;
use crate::pool::WorkItem;

use super::filter::{Eligibility, EligibilityFilter};

const SOURCE_LABEL: &str = "object_store";

/// An object selected for copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyJob {
    /// Key in the source store; reused as the destination key.
    pub location: ObjectPath,
    /// Date used for the cutoff decision.
    pub date: chrono::NaiveDate,
    pub size: u64,
}

impl WorkItem for CopyJob {
    type Key = ObjectPath;

    fn key(&self) -> ObjectPath {
        self.location.clone()
    }
}

/// Counters for enumeration decisions.
#[derive(Debug, Default)]
pub struct ScanStatistics {
    listed: AtomicU64,
    wrong_extension: AtomicU64,
    scanned: AtomicU64,
    before_cutoff: AtomicU64,
    undated: AtomicU64,
    queued: Arc<AtomicU64>,
    listing_error: Mutex<Option<String>>,
}

impl ScanStatistics {
    /// Live count of queued jobs.
    pub fn queued_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.queued)
    }

    fn record_listing_error(&self, error: String) {
        if let Ok(mut slot) = self.listing_error.lock() {
            slot.get_or_insert(error);
        }
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            listed: self.listed.load(Ordering::Relaxed),
            wrong_extension: self.wrong_extension.load(Ordering::Relaxed),
            scanned: self.scanned.load(Ordering::Relaxed),
            before_cutoff: self.before_cutoff.load(Ordering::Relaxed),
            undated: self.undated.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            listing_error: self
                .listing_error
                .lock()
                .ok()
                .and_then(|slot| slot.clone()),
        }
    }
}

/// Point-in-time copy of [`ScanStatistics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSnapshot {
    /// Objects returned by the listing.
    pub listed: u64,
    /// Objects dropped by the extension allow-list.
    pub wrong_extension: u64,
    /// Objects with an allowed extension.
    pub scanned: u64,
    pub before_cutoff: u64,
    pub undated: u64,
    pub queued: u64,
    /// First listing error, if the listing ended early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_error: Option<String>,
}

/// Streams [`CopyJob`]s for every eligible object below a prefix.
pub struct ObjectEnumerator {
    store: Arc<dyn ObjectStore>,
    prefix: Option<ObjectPath>,
    filter: EligibilityFilter,
    stats: Arc<ScanStatistics>,
}

impl ObjectEnumerator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        prefix: Option<ObjectPath>,
        filter: EligibilityFilter,
    ) -> Self {
        Self {
            store,
            prefix,
            filter,
            stats: Arc::new(ScanStatistics::default()),
        }
    }

    pub fn stats(&self) -> Arc<ScanStatistics> {
        Arc::clone(&self.stats)
    }

    /// Lazily lists the source and yields eligible jobs in listing order.
    ///
    /// A listing error ends the stream and is kept in the statistics.
    pub fn jobs(&self) -> impl Stream<Item = CopyJob> + Send + '_ {
        let stats = Arc::clone(&self.stats);
        self.store
            .list(self.prefix.as_ref())
            .scan((), move |_, entry| {
                let next = match entry {
                    Ok(meta) => Some(meta),
                    Err(e) => {
                        warn!("Error listing source objects: {}", e);
                        stats.record_listing_error(e.to_string());
                        None
                    }
                };
                future::ready(next)
            })
            .filter_map(move |meta| future::ready(self.classify(meta)))
    }

    fn classify(&self, meta: ObjectMeta) -> Option<CopyJob> {
        let stats = &self.stats;
        stats.listed.fetch_add(1, Ordering::Relaxed);
        let key = meta.location.as_ref();

        if !self.filter.has_allowed_extension(key) {
            stats.wrong_extension.fetch_add(1, Ordering::Relaxed);
            metrics::ITEMS_FILTERED
                .with_label_values(&[SOURCE_LABEL, "wrong_extension"])
                .inc();
            return None;
        }

        let scanned = stats.scanned.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Scanning [{}]: {}", scanned, key);

        match self.filter.classify(key, meta.last_modified) {
            Eligibility::Eligible { date, from_path } => {
                stats.queued.fetch_add(1, Ordering::Relaxed);
                if from_path {
                    debug!("  Eligible: dated {} - queuing for copy", date);
                } else {
                    debug!("  Eligible: last modified {} - queuing for copy", date);
                }
                Some(CopyJob {
                    location: meta.location,
                    date,
                    size: meta.size as u64,
                })
            }
            Eligibility::BeforeCutoff(date) => {
                stats.before_cutoff.fetch_add(1, Ordering::Relaxed);
                metrics::ITEMS_FILTERED
                    .with_label_values(&[SOURCE_LABEL, "before_cutoff"])
                    .inc();
                debug!(
                    "  Skipped: dated {} (before {})",
                    date,
                    self.filter.cutoff()
                );
                None
            }
            Eligibility::Undated => {
                stats.undated.fetch_add(1, Ordering::Relaxed);
                metrics::ITEMS_FILTERED
                    .with_label_values(&[SOURCE_LABEL, "undated"])
                    .inc();
                debug!("  Skipped: no valid date in path");
                None
            }
            Eligibility::WrongExtension => {
                stats.wrong_extension.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}
