use super::{types::Config, ConfigError};

/// Smallest multipart part accepted by S3 for every part but the last.
const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Longest progress interval, one day.
const MAX_PROGRESS_INTERVAL_SECS: u64 = 86_400;

/// Validate configuration
/// Currently validates:
/// - Concurrency limits and timeouts are not 0
/// - Progress interval is at most a day
/// - Spreadsheet column is 1-based and the output suffix is set
/// - Multipart settings are usable by every store
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pool.concurrency == 0 {
        return invalid("pool.concurrency cannot be 0");
    }

    if config.pool.progress_interval_secs > MAX_PROGRESS_INTERVAL_SECS {
        return Err(ConfigError::ValidationError(format!(
            "pool.progress_interval_secs cannot exceed {} seconds",
            MAX_PROGRESS_INTERVAL_SECS
        )));
    }

    if config.identity.timeout_secs == 0 {
        return invalid("identity.timeout_secs cannot be 0");
    }

    // Spreadsheet validation
    if config.spreadsheet.id_column == 0 {
        return invalid("spreadsheet.id_column is 1-based and cannot be 0");
    }
    if config.spreadsheet.output_suffix.is_empty() {
        return invalid("spreadsheet.output_suffix cannot be empty");
    }

    // Migration validation
    let migration = &config.migration;
    if migration.max_workers == 0 {
        return invalid("migration.max_workers cannot be 0");
    }
    if migration.part_size_bytes < MIN_PART_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "migration.part_size_bytes must be at least {} bytes",
            MIN_PART_SIZE
        )));
    }
    if migration.part_concurrency == 0 {
        return invalid("migration.part_concurrency cannot be 0");
    }
    if migration.extensions.is_empty() {
        return invalid("migration.extensions cannot be empty");
    }

    // Downloader validation
    if config.downloader.concurrency == 0 {
        return invalid("downloader.concurrency cannot be 0");
    }
    if config.downloader.timeout_secs == 0 {
        return invalid("downloader.timeout_secs cannot be 0");
    }

    Ok(())
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message.to_string()))
}
