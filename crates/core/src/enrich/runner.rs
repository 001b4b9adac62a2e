//! Name enrichment runner.

use futures::stream;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::identity::IdentityResolver;
use crate::metrics;
use crate::pool::{Outcome, PoolConfig, PoolSummary, WorkerPool};
use crate::spreadsheet::{output_path, validate_input, SpreadsheetConfig, UserRow, UserSheet};

use super::sink::NameColumnSink;
use super::EnrichmentError;

const POOL_NAME: &str = "resolve_names";

/// Outcome of an enrichment run.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sheet: String,
    /// Rows queued for resolution.
    pub rows: u64,
    /// Rows skipped because the identifier was blank.
    pub blank_rows: u64,
    pub resolved: u64,
    pub placeholders: u64,
    /// Results that could not be written into their cell.
    pub write_errors: u64,
    pub summary: PoolSummary,
}

/// Resolves the identifier column of a workbook into display names.
pub struct NameEnrichment {
    resolver: Arc<dyn IdentityResolver>,
    spreadsheet: SpreadsheetConfig,
    pool: PoolConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl NameEnrichment {
    pub fn new(
        resolver: Arc<dyn IdentityResolver>,
        spreadsheet: SpreadsheetConfig,
        pool: PoolConfig,
    ) -> Self {
        Self {
            resolver,
            spreadsheet,
            pool,
            shutdown: None,
        }
    }

    /// Stops dispatching new lookups once the flag turns `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Runs the enrichment and saves `<stem><suffix>.<ext>` next to `input`.
    pub async fn run(&self, input: &Path) -> Result<EnrichmentReport, EnrichmentError> {
        validate_input(input)?;

        let path = input.to_path_buf();
        let mut sheet = tokio::task::spawn_blocking(move || UserSheet::open(&path))
            .await
            .map_err(|e| EnrichmentError::Task(e.to_string()))??;

        let sheet_name = sheet.sheet_name()?;
        let selected = sheet.user_rows(self.spreadsheet.id_column)?;
        metrics::ITEMS_FILTERED
            .with_label_values(&["spreadsheet", "blank_id"])
            .inc_by(selected.blank);

        let rows = selected.rows.len() as u64;
        info!(
            "Sheet '{}': {} user IDs queued, {} rows with blank ID skipped",
            sheet_name, rows, selected.blank
        );

        let column = sheet.add_result_column(&self.spreadsheet.header)?;

        let mut pool = WorkerPool::from_config(POOL_NAME, &self.pool)?.with_expected(rows);
        if let Some(shutdown) = &self.shutdown {
            pool = pool.with_shutdown(shutdown.clone());
        }

        let resolver = Arc::clone(&self.resolver);
        let mut sink = NameColumnSink::new(&mut sheet, column);
        let summary = pool
            .run(
                stream::iter(selected.rows),
                move |row: UserRow| {
                    let resolver = Arc::clone(&resolver);
                    async move {
                        match resolver.resolve(&row.user_id).await {
                            Ok(name) => Outcome::Succeeded(name),
                            Err(e) => {
                                warn!("Failed to fetch {}: {}", row.user_id, e);
                                Outcome::failed(e.to_string())
                            }
                        }
                    }
                },
                &mut sink,
            )
            .await;

        let resolved = sink.resolved();
        let placeholders = sink.placeholders();
        let write_errors = sink.write_errors();
        if write_errors > 0 {
            warn!("{} results could not be written to the sheet", write_errors);
        }

        if summary.interrupted {
            warn!(
                "Run interrupted after {} of {} rows; saving partial results",
                summary.completed, rows
            );
        }

        let output = output_path(input, &self.spreadsheet.output_suffix);
        let target = output.clone();
        tokio::task::spawn_blocking(move || sheet.save_as(&target))
            .await
            .map_err(|e| EnrichmentError::Task(e.to_string()))??;

        info!("Processing complete! Updated file saved as: {}", output.display());

        Ok(EnrichmentReport {
            input: input.to_path_buf(),
            output,
            sheet: sheet_name,
            rows,
            blank_rows: selected.blank,
            resolved,
            placeholders,
            write_errors,
            summary,
        })
    }
}
