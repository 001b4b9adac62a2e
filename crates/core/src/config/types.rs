use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::downloader::DownloaderConfig;
use crate::identity::IdentityConfig;
use crate::migrate::MigrationConfig;
use crate::pool::PoolConfig;
use crate::spreadsheet::SpreadsheetConfig;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub spreadsheet: SpreadsheetConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Also append log lines to this file.
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

const REDACTED: &str = "<redacted>";

/// Sanitized config for log output (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub pool: PoolConfig,
    pub identity: SanitizedIdentityConfig,
    pub spreadsheet: SpreadsheetConfig,
    pub migration: MigrationConfig,
    pub downloader: DownloaderConfig,
    pub logging: LoggingConfig,
}

/// Sanitized identity config (secret key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIdentityConfig {
    pub base_url: String,
    /// `<redacted>` when a key is set, empty otherwise.
    pub secret_key: String,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let mut migration = config.migration.clone();
        migration.source = migration.source.as_ref().map(|store| store.redacted());
        migration.destination = migration.destination.as_ref().map(|store| store.redacted());

        Self {
            pool: config.pool.clone(),
            identity: SanitizedIdentityConfig {
                base_url: config.identity.base_url.clone(),
                secret_key: if config.identity.secret_configured() {
                    REDACTED.to_string()
                } else {
                    String::new()
                },
                timeout_secs: config.identity.timeout_secs,
            },
            spreadsheet: config.spreadsheet.clone(),
            migration,
            downloader: config.downloader.clone(),
            logging: config.logging.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::StoreConfig;

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config = Config::default();
        config.identity.secret_key = "sk_live_abc".to_string();
        config.migration.destination = Some(StoreConfig::S3 {
            bucket: "archive".to_string(),
            region: None,
            endpoint: None,
            access_key_id: Some("AKIA".to_string()),
            secret_access_key: Some("shh".to_string()),
        });

        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(!json.contains("sk_live_abc"));
        assert!(!json.contains("shh"));
        assert!(json.contains("<redacted>"));
        assert!(json.contains("archive"));
    }

    #[test]
    fn test_sanitized_config_without_secret() {
        let sanitized = SanitizedConfig::from(&Config::default());
        assert_eq!(sanitized.identity.secret_key, "");
    }
}
