mod common;

use std::path::Path;

use tempfile::TempDir;

use common::{run_opsbatch, write_file};

fn seed(root: &Path, key: &str, content: &[u8]) {
    let path = root.join(key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn write_config(dir: &TempDir) {
    write_file(
        dir,
        "opsbatch.toml",
        r#"
[pool]
progress_interval_secs = 0

[migration]
cutoff_date = "2025-09-07"
max_workers = 3

[migration.source]
kind = "local"
root = "source"

[migration.destination]
kind = "local"
root = "archive"
"#,
    );
}

fn seed_source(dir: &TempDir) {
    let source = dir.path().join("source");
    seed(&source, "port1/2025-09-06/old.mp4", b"old");
    seed(&source, "port1/2025-09-07/edge.mp4", b"edge");
    seed(&source, "port2/2025-10-01/new.MKV", b"newer bytes");
    seed(&source, "port2/2025-10-01/notes.txt", b"text");
    seed(&source, "port2/misc/undated.mp4", b"undated");
}

#[tokio::test]
async fn test_migrate_copies_eligible_objects_once() {
    let dir = TempDir::new().unwrap();
    write_config(&dir);
    seed_source(&dir);
    let archive = dir.path().join("archive");

    let output = run_opsbatch(&dir, &["migrate", "--metrics-file", "metrics.prom"], &[]).await;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert_eq!(
        std::fs::read(archive.join("port1/2025-09-07/edge.mp4")).unwrap(),
        b"edge"
    );
    assert_eq!(
        std::fs::read(archive.join("port2/2025-10-01/new.MKV")).unwrap(),
        b"newer bytes"
    );
    assert!(!archive.join("port1/2025-09-06/old.mp4").exists());
    assert!(!archive.join("port2/2025-10-01/notes.txt").exists());
    assert!(!archive.join("port2/misc/undated.mp4").exists());

    let metrics = std::fs::read_to_string(dir.path().join("metrics.prom")).unwrap();
    assert!(metrics.contains("opsbatch_bytes_copied_total 15"));

    // A second run finds everything in place
    let output = run_opsbatch(&dir, &["migrate", "--metrics-file", "metrics.prom"], &[]).await;
    assert!(output.status.success());
    let metrics = std::fs::read_to_string(dir.path().join("metrics.prom")).unwrap();
    assert!(metrics.contains("opsbatch_bytes_copied_total 0"));
}

#[tokio::test]
async fn test_migrate_dry_run_copies_nothing() {
    let dir = TempDir::new().unwrap();
    write_config(&dir);
    seed_source(&dir);

    let output = run_opsbatch(&dir, &["migrate", "--dry-run"], &[]).await;
    assert!(output.status.success());

    let archive = dir.path().join("archive");
    assert!(!archive.join("port1/2025-09-07/edge.mp4").exists());
}

#[tokio::test]
async fn test_migrate_requires_cutoff() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir,
        "opsbatch.toml",
        r#"
[migration.source]
kind = "local"
root = "source"

[migration.destination]
kind = "local"
root = "archive"
"#,
    );
    std::fs::create_dir_all(dir.path().join("source")).unwrap();

    let output = run_opsbatch(&dir, &["migrate"], &[]).await;
    assert!(!output.status.success());
}

#[tokio::test]
async fn test_migrate_missing_source_root_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir);

    let output = run_opsbatch(&dir, &["migrate"], &[]).await;
    assert!(!output.status.success());
}
