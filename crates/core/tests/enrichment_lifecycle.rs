//! Name enrichment integration tests against the mock identity resolver.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_test::assert_ok;

use opsbatch_core::pool::PoolConfig;
use opsbatch_core::spreadsheet::{SpreadsheetConfig, UserSheet};
use opsbatch_core::testing::{fixtures, MockIdentityResolver};
use opsbatch_core::{EnrichmentError, NameEnrichment, SpreadsheetError};

fn pool(concurrency: usize) -> PoolConfig {
    PoolConfig {
        concurrency,
        progress_interval_secs: 0,
    }
}

#[tokio::test]
async fn test_enrichment_fills_names_and_placeholders() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("clerk.xlsx");

    let mut rows: Vec<Vec<String>> = vec![vec![
        "Name".into(),
        "Email".into(),
        "Team".into(),
        "Role".into(),
        "User ID".into(),
    ]];
    for i in 0..20 {
        let id = match i {
            5 | 11 => String::new(),
            _ => format!("user_{}", i),
        };
        rows.push(vec![format!("n{}", i), String::new(), String::new(), String::new(), id]);
    }
    let borrowed: Vec<Vec<&str>> = rows
        .iter()
        .map(|r| r.iter().map(String::as_str).collect())
        .collect();
    let refs: Vec<&[&str]> = borrowed.iter().map(Vec::as_slice).collect();
    fixtures::write_workbook(&input, &refs).unwrap();

    let resolver = Arc::new(MockIdentityResolver::new());
    for i in 0..20 {
        resolver.set_name(format!("user_{}", i), format!("Name {}", i)).await;
    }
    resolver.set_failure("user_7", 503).await;
    resolver.set_delay(Duration::from_millis(10)).await;

    let enrichment = NameEnrichment::new(resolver.clone(), SpreadsheetConfig::default(), pool(3));
    let report = assert_ok!(enrichment.run(&input).await);

    assert_eq!(report.rows, 18);
    assert_eq!(report.blank_rows, 2);
    assert_eq!(report.resolved, 17);
    assert_eq!(report.placeholders, 1);
    assert_eq!(report.write_errors, 0);
    assert_eq!(report.output, dir.path().join("clerk_updated.xlsx"));
    assert_eq!(resolver.call_count().await, 18);
    assert!(resolver.peak_in_flight() <= 3);

    let sheet = UserSheet::open(&report.output).unwrap();
    assert_eq!(sheet.value(6, 1).unwrap(), "User Name");
    // Row 2 holds user_0
    assert_eq!(sheet.value(6, 2).unwrap(), "Name 0");
    assert_eq!(sheet.value(6, 7).unwrap(), "");
    assert_eq!(sheet.value(6, 9).unwrap(), "Unknown User (user_7)");
    assert_eq!(sheet.value(6, 21).unwrap(), "Name 19");
}

#[tokio::test]
async fn test_enrichment_rejects_legacy_workbook() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("old.xls");
    std::fs::write(&input, b"not really a workbook").unwrap();

    let resolver = Arc::new(MockIdentityResolver::new());
    let enrichment = NameEnrichment::new(resolver.clone(), SpreadsheetConfig::default(), pool(2));

    let err = enrichment.run(&input).await.unwrap_err();
    assert!(matches!(
        err,
        EnrichmentError::Spreadsheet(SpreadsheetError::UnsupportedType { .. })
    ));
    assert_eq!(resolver.call_count().await, 0);
}
