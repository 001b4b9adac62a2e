//! Common helpers for running the `opsbatch` binary in tests.

use std::path::Path;
use std::process::Output;

use tempfile::TempDir;

/// Re-export fixtures for test convenience
pub use opsbatch_core::testing::fixtures;

/// Runs the binary inside `dir` with a clean environment and quiet logs.
pub async fn run_opsbatch(dir: &TempDir, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut command = tokio::process::Command::new(env!("CARGO_BIN_EXE_opsbatch"));
    command
        .args(args)
        .current_dir(dir.path())
        .env_remove("CLERK_SECRET_KEY")
        .env_remove("OPSBATCH_CONFIG")
        .env("RUST_LOG", "warn")
        .kill_on_drop(true);
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().await.expect("Failed to run opsbatch")
}

/// Writes `content` to `name` inside `dir` and returns the full path.
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Reads a cell of the first worksheet as a string.
pub fn cell(path: &Path, column: u32, row: u32) -> String {
    let book = umya_spreadsheet::reader::xlsx::read(path).unwrap();
    book.get_sheet(&0).unwrap().get_value((column, row))
}
