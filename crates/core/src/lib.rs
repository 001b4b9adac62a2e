pub mod config;
pub mod downloader;
pub mod enrich;
pub mod identity;
pub mod metrics;
pub mod migrate;
pub mod pool;
pub mod spreadsheet;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LogFormat,
    LoggingConfig, SanitizedConfig, DEFAULT_CONFIG_PATH,
};
pub use downloader::{
    read_url_list, DownloadBatch, DownloadError, DownloadReport, DownloaderConfig,
    VideoDownloader, YtDlpDownloader,
};
pub use enrich::{EnrichmentError, EnrichmentReport, NameEnrichment};
pub use identity::{ClerkClient, IdentityConfig, IdentityError, IdentityResolver};
pub use migrate::{
    build_store, Migration, MigrationConfig, MigrationError, MigrationPlan, MigrationReport,
    StoreConfig,
};
pub use pool::{Outcome, PoolConfig, PoolError, PoolSummary, WorkerPool};
pub use spreadsheet::{SpreadsheetConfig, SpreadsheetError};
