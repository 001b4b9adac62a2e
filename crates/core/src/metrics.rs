//! Prometheus metrics for batch runs.
//!
//! This module provides metrics for:
//! - Worker pools (items by outcome, durations, in-flight operations)
//! - Enumeration (items dropped by local filters)
//! - Object copies (bytes transferred)
//! - External services (identity API)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::path::Path;

/// Registry holding every opsbatch metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        // Registration only fails on duplicate descriptors.
        let _ = registry.register(metric);
    }
    registry
});

// =============================================================================
// Worker Pool Metrics
// =============================================================================

/// Items processed by pool and outcome.
pub static POOL_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("opsbatch_pool_items_total", "Total work items processed"),
        &["pool", "outcome"], // outcome: "succeeded", "skipped", "failed"
    )
    .unwrap()
});

/// Per-item operation duration in seconds.
pub static POOL_ITEM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "opsbatch_pool_item_duration_seconds",
            "Duration of a single work item operation",
        )
        .buckets(vec![
            0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0,
        ]),
        &["pool"],
    )
    .unwrap()
});

/// Operations currently running.
pub static POOL_IN_FLIGHT: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "opsbatch_pool_in_flight",
            "Number of work item operations currently running",
        ),
        &["pool"],
    )
    .unwrap()
});

// =============================================================================
// Enumeration Metrics
// =============================================================================

/// Items dropped before dispatch by reason.
pub static ITEMS_FILTERED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "opsbatch_items_filtered_total",
            "Source entries dropped by local filters",
        ),
        &["source", "reason"], // reason: "blank_id", "wrong_extension", "before_cutoff", "undated"
    )
    .unwrap()
});

// =============================================================================
// Object Copy Metrics
// =============================================================================

/// Bytes written to the destination store.
pub static BYTES_COPIED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "opsbatch_bytes_copied_total",
        "Total bytes copied to the destination store",
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "opsbatch_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "opsbatch_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(POOL_ITEMS.clone()),
        Box::new(POOL_ITEM_DURATION.clone()),
        Box::new(POOL_IN_FLIGHT.clone()),
        Box::new(ITEMS_FILTERED.clone()),
        Box::new(BYTES_COPIED.clone()),
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Write the text exposition to `path`, e.g. for a node exporter textfile collector.
pub fn write_metrics_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, encode_metrics())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_registered_metrics() {
        POOL_ITEMS.with_label_values(&["metrics-test", "succeeded"]).inc();
        BYTES_COPIED.inc_by(0);

        let text = encode_metrics();
        assert!(text.contains("opsbatch_pool_items_total"));
        assert!(text.contains("metrics-test"));
    }

    #[test]
    fn test_write_metrics_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("opsbatch.prom");
        POOL_ITEMS.with_label_values(&["file-test", "failed"]).inc();

        write_metrics_file(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("file-test"));
    }
}
