//! Configuration for object store migration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::MigrationError;

/// Migration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Store objects are copied from.
    #[serde(default)]
    pub source: Option<StoreConfig>,

    /// Store objects are copied to, under the same key.
    #[serde(default)]
    pub destination: Option<StoreConfig>,

    /// Only list source objects below this prefix.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Inclusive lower bound for the path date (YYYY-MM-DD).
    #[serde(default)]
    pub cutoff_date: Option<NaiveDate>,

    /// Index of the `/`-separated key segment holding the date,
    /// e.g. 1 for `port1/2025-07-15/recording.mp4`.
    #[serde(default = "default_date_segment")]
    pub date_segment: usize,

    /// What to do with objects whose path has no parseable date.
    #[serde(default)]
    pub undated: UndatedPolicy,

    /// Allowed file extensions (case-insensitive, leading dot optional).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Maximum concurrent object copies.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Multipart upload part size in bytes.
    #[serde(default = "default_part_size")]
    pub part_size_bytes: usize,

    /// Parts uploaded concurrently per object.
    #[serde(default = "default_part_concurrency")]
    pub part_concurrency: usize,
}

fn default_date_segment() -> usize {
    1
}

fn default_extensions() -> Vec<String> {
    [".mp4", ".avi", ".mov", ".mkv", ".webm", ".m4v"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn default_max_workers() -> usize {
    20
}

fn default_part_size() -> usize {
    10 * 1024 * 1024
}

fn default_part_concurrency() -> usize {
    5
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            prefix: None,
            cutoff_date: None,
            date_segment: default_date_segment(),
            undated: UndatedPolicy::default(),
            extensions: default_extensions(),
            max_workers: default_max_workers(),
            part_size_bytes: default_part_size(),
            part_concurrency: default_part_concurrency(),
        }
    }
}

impl MigrationConfig {
    pub fn source(&self) -> Result<&StoreConfig, MigrationError> {
        self.source
            .as_ref()
            .ok_or_else(|| MigrationError::NotConfigured("migration.source is not set".to_string()))
    }

    pub fn destination(&self) -> Result<&StoreConfig, MigrationError> {
        self.destination.as_ref().ok_or_else(|| {
            MigrationError::NotConfigured("migration.destination is not set".to_string())
        })
    }

    pub fn cutoff(&self) -> Result<NaiveDate, MigrationError> {
        self.cutoff_date.ok_or_else(|| {
            MigrationError::NotConfigured("migration.cutoff_date is not set".to_string())
        })
    }
}

/// Policy for objects without a parseable date segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndatedPolicy {
    /// Leave the object out and count it as undated.
    #[default]
    Exclude,
    /// Filter on the object's last-modified date instead.
    LastModified,
}

/// Object store backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Google Cloud Storage; credentials come from the usual GOOGLE_* environment.
    Gcs {
        bucket: String,
        #[serde(default)]
        service_account_path: Option<PathBuf>,
    },
    /// Amazon S3 or an S3-compatible endpoint; credentials default to AWS_* environment.
    S3 {
        bucket: String,
        #[serde(default)]
        region: Option<String>,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        access_key_id: Option<String>,
        #[serde(default)]
        secret_access_key: Option<String>,
    },
    /// A directory on the local filesystem.
    Local { root: PathBuf },
}

impl StoreConfig {
    /// URL-like description for log lines.
    pub fn describe(&self) -> String {
        match self {
            Self::Gcs { bucket, .. } => format!("gs://{}", bucket),
            Self::S3 { bucket, .. } => format!("s3://{}", bucket),
            Self::Local { root } => format!("file://{}", root.display()),
        }
    }

    /// Copy with credentials masked.
    pub fn redacted(&self) -> Self {
        match self {
            Self::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
            } => Self::S3 {
                bucket: bucket.clone(),
                region: region.clone(),
                endpoint: endpoint.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.as_ref().map(|_| "<redacted>".to_string()),
            },
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.max_workers, 20);
        assert_eq!(config.date_segment, 1);
        assert_eq!(config.undated, UndatedPolicy::Exclude);
        assert!(config.extensions.contains(&".mkv".to_string()));
        assert!(matches!(config.cutoff(), Err(MigrationError::NotConfigured(_))));
    }

    #[test]
    fn test_deserialize_stores() {
        let toml = r#"
cutoff_date = "2025-09-07"
undated = "last_modified"

[source]
kind = "gcs"
bucket = "recordings"

[destination]
kind = "s3"
bucket = "archive"
region = "eu-west-1"
secret_access_key = "hunter2"
"#;
        let config: MigrationConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.cutoff().unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 7).unwrap()
        );
        assert_eq!(config.undated, UndatedPolicy::LastModified);
        assert_eq!(config.source().unwrap().describe(), "gs://recordings");

        let destination = config.destination().unwrap();
        assert_eq!(destination.describe(), "s3://archive");
        match destination.redacted() {
            StoreConfig::S3 {
                secret_access_key, ..
            } => assert_eq!(secret_access_key.as_deref(), Some("<redacted>")),
            other => panic!("unexpected store: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_cutoff_rejected() {
        let result: Result<MigrationConfig, _> = toml::from_str(r#"cutoff_date = "07/09/2025""#);
        assert!(result.is_err());
    }
}
