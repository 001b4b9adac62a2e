mod cli;
mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use opsbatch_core::{load_config, metrics, validate_config, Config, SanitizedConfig};

use cli::{Cli, Command};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration before logging so the log file setting applies
    let loaded = load_config(cli.config.as_deref());
    let logging_config = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    logging::init(&logging_config).context("Failed to initialize logging")?;

    let mut config = match &cli.config {
        Some(path) => loaded.with_context(|| format!("Failed to load config from {:?}", path))?,
        None => loaded.context("Failed to load configuration")?,
    };
    apply_overrides(&mut config, &cli);

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Compute config hash for the run header
    let sanitized = SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];
    let run_id = uuid::Uuid::new_v4();

    info!(
        run_id = %run_id,
        config_hash = config_hash_short,
        "opsbatch {} starting {}",
        VERSION,
        cli.command.name()
    );
    debug!("Effective configuration: {}", config_json);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown requested, waiting for in-flight work to finish");
        let _ = shutdown_tx.send(true);
    });

    let result = match &cli.command {
        Command::ResolveNames { file } => {
            commands::resolve_names(&config, file, shutdown_rx).await
        }
        Command::Migrate { dry_run } => commands::migrate(&config, *dry_run, shutdown_rx).await,
        Command::Download { url_file } => {
            commands::download(&config, url_file, shutdown_rx).await
        }
    };

    // Metrics are written even when the command failed part way
    if let Some(path) = &cli.metrics_file {
        metrics::write_metrics_file(path)
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
        info!("Metrics written to {:?}", path);
    }

    result
}

/// Applies command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(concurrency) = cli.concurrency {
        match cli.command {
            Command::ResolveNames { .. } => config.pool.concurrency = concurrency,
            Command::Migrate { .. } => config.migration.max_workers = concurrency,
            Command::Download { .. } => config.downloader.concurrency = concurrency,
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_override_targets_selected_command() {
        let cli = Cli::parse_from(["opsbatch", "--concurrency", "3", "migrate"]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.migration.max_workers, 3);
        assert_eq!(config.pool.concurrency, 10);

        let cli = Cli::parse_from(["opsbatch", "--concurrency", "7", "download", "urls.txt"]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.downloader.concurrency, 7);
    }
}
