use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use opsbatch_core::identity::IdentityResolver;
use opsbatch_core::spreadsheet::validate_input;
use opsbatch_core::{
    build_store, read_url_list, ClerkClient, Config, DownloadBatch, Migration, NameEnrichment,
    YtDlpDownloader,
};

/// Resolves the user IDs in `file` and writes the `_updated` copy.
pub async fn resolve_names(
    config: &Config,
    file: &Path,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    validate_input(file).context("Invalid input file")?;

    let resolver: Arc<dyn IdentityResolver> = Arc::new(
        ClerkClient::new(&config.identity).context("Failed to create identity client")?,
    );
    info!("Using identity resolver: {}", resolver.name());

    let report = NameEnrichment::new(resolver, config.spreadsheet.clone(), config.pool.clone())
        .with_shutdown(shutdown)
        .run(file)
        .await
        .with_context(|| format!("Failed to process {:?}", file))?;

    info!(
        "Resolved {} of {} user IDs ({} placeholders, {} blank rows, {} write errors) in {:.1}s",
        report.resolved,
        report.rows,
        report.placeholders,
        report.blank_rows,
        report.write_errors,
        report.summary.elapsed.as_secs_f64()
    );
    Ok(())
}

/// Copies eligible objects, or lists them with `dry_run`.
pub async fn migrate(
    config: &Config,
    dry_run: bool,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let migration_config = &config.migration;
    let source_config = migration_config.source()?;
    let destination_config = migration_config.destination()?;
    info!(
        "Migrating {} -> {}",
        source_config.describe(),
        destination_config.describe()
    );

    let source = build_store(source_config, false).context("Failed to open source store")?;
    let destination =
        build_store(destination_config, true).context("Failed to open destination store")?;

    let migration = Migration::new(
        source,
        destination,
        migration_config.clone(),
        config.pool.clone(),
    )?
    .with_shutdown(shutdown);

    if dry_run {
        let plan = migration.plan().await.context("Dry run failed")?;
        for job in &plan.jobs {
            info!("Would copy {} (dated {}, {} bytes)", job.key, job.date, job.size);
        }
        return Ok(());
    }

    migration.run().await.context("Migration failed")?;
    Ok(())
}

/// Downloads every URL in `url_file`.
pub async fn download(
    config: &Config,
    url_file: &Path,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let items = read_url_list(url_file).await?;
    if items.is_empty() {
        info!("No URLs found in {:?}", url_file);
        return Ok(());
    }

    let downloader = YtDlpDownloader::new(config.downloader.clone());
    let report = DownloadBatch::new(
        Arc::new(downloader),
        &config.downloader.output_dir,
        config.downloader.concurrency,
        config.pool.clone(),
    )
    .with_shutdown(shutdown)
    .run(items)
    .await?;

    info!(
        "{} downloaded, {} failed",
        report.downloaded,
        report.failed.len()
    );
    Ok(())
}
