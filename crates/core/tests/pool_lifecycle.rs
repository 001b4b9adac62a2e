//! Worker pool lifecycle integration tests.
//!
//! These tests drive the pool end to end: bounded fan-out, exactly one
//! result per item, and early stop on shutdown.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use tokio::sync::watch;
use tokio_test::assert_ok;

use opsbatch_core::pool::{Outcome, WorkItem, WorkResult, WorkerPool};

struct Item(u32);

impl WorkItem for Item {
    type Key = u32;

    fn key(&self) -> u32 {
        self.0
    }
}

#[tokio::test]
async fn test_in_flight_never_exceeds_concurrency() {
    let pool = assert_ok!(WorkerPool::new("bounded", 4));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let op_in_flight = Arc::clone(&in_flight);
    let op_peak = Arc::clone(&peak);
    let mut results: Vec<WorkResult<u32, u32>> = Vec::new();
    let summary = pool
        .run(
            stream::iter((0..50).map(Item)),
            move |item: Item| {
                let in_flight = Arc::clone(&op_in_flight);
                let peak = Arc::clone(&op_peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Outcome::Succeeded(item.0 * 2)
                }
            },
            &mut results,
        )
        .await;

    assert!(peak.load(Ordering::SeqCst) <= 4);
    assert!(summary.stats.peak_in_flight <= 4);
    assert_eq!(summary.dispatched, 50);
    assert_eq!(summary.completed, 50);
    assert_eq!(summary.stats.succeeded, 50);
    assert_eq!(pool.stats().in_flight(), 0);

    let keys: HashSet<u32> = results.iter().map(|r| r.key).collect();
    assert_eq!(keys.len(), 50);
    assert!(results
        .iter()
        .all(|r| r.outcome == Outcome::Succeeded(r.key * 2)));
}

#[tokio::test]
async fn test_mixed_outcomes_are_counted() {
    let pool = assert_ok!(WorkerPool::new("mixed", 3));
    let mut results: Vec<WorkResult<u32, ()>> = Vec::new();

    let summary = pool
        .run(
            stream::iter((1..=12).map(Item)),
            |item: Item| async move {
                match item.0 {
                    n if n % 4 == 0 => Outcome::failed(format!("item {} failed", n)),
                    n if n % 3 == 0 => Outcome::skipped("nothing to do"),
                    _ => Outcome::Succeeded(()),
                }
            },
            &mut results,
        )
        .await;

    // 4, 8, 12 fail; 3, 6, 9 skip
    assert_eq!(summary.stats.failed, 3);
    assert_eq!(summary.stats.skipped, 3);
    assert_eq!(summary.stats.succeeded, 6);
    assert_eq!(summary.stats.processed(), 12);
    assert!(!summary.interrupted);
}

#[tokio::test]
async fn test_shutdown_stops_dispatch_and_drains() {
    let (tx, rx) = watch::channel(false);
    let pool = assert_ok!(WorkerPool::new("shutdown", 2)).with_shutdown(rx);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        let _ = tx.send(true);
    });

    let mut results: Vec<WorkResult<u32, ()>> = Vec::new();
    let summary = pool
        .run(
            stream::iter((0..1_000).map(Item)),
            |_item: Item| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Outcome::Succeeded(())
            },
            &mut results,
        )
        .await;

    assert!(summary.interrupted);
    assert!(summary.dispatched < 1_000);
    assert_eq!(summary.completed, summary.dispatched);
    assert_eq!(results.len() as u64, summary.dispatched);
}
