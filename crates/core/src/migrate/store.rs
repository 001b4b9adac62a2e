//! Store construction from configuration.

use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::info;

use super::config::StoreConfig;
use super::MigrationError;

/// Builds a store client for `config`.
///
/// A missing local root is an error unless `create_missing` is set, which is
/// how the destination side is opened.
pub fn build_store(
    config: &StoreConfig,
    create_missing: bool,
) -> Result<Arc<dyn ObjectStore>, MigrationError> {
    let store: Arc<dyn ObjectStore> = match config {
        StoreConfig::Gcs {
            bucket,
            service_account_path,
        } => {
            let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
            if let Some(path) = service_account_path {
                builder = builder.with_service_account_path(path.to_string_lossy());
            }
            Arc::new(builder.build().map_err(|source| MigrationError::Store {
                store: config.describe(),
                source,
            })?)
        }
        StoreConfig::S3 {
            bucket,
            region,
            endpoint,
            access_key_id,
            secret_access_key,
        } => {
            let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
            if let Some(region) = region {
                builder = builder.with_region(region);
            }
            if let Some(endpoint) = endpoint {
                builder = builder
                    .with_endpoint(endpoint)
                    .with_allow_http(endpoint.starts_with("http://"));
            }
            if let Some(key) = access_key_id {
                builder = builder.with_access_key_id(key);
            }
            if let Some(secret) = secret_access_key {
                builder = builder.with_secret_access_key(secret);
            }
            Arc::new(builder.build().map_err(|source| MigrationError::Store {
                store: config.describe(),
                source,
            })?)
        }
        StoreConfig::Local { root } => {
            if create_missing {
                std::fs::create_dir_all(root).map_err(|source| MigrationError::LocalRoot {
                    path: root.clone(),
                    source,
                })?;
            } else if !root.is_dir() {
                return Err(MigrationError::LocalRoot {
                    path: root.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "directory does not exist",
                    ),
                });
            }
            let store =
                LocalFileSystem::new_with_prefix(root).map_err(|source| MigrationError::Store {
                    store: config.describe(),
                    source,
                })?;
            Arc::new(store)
        }
    };

    info!("Opened store {}", config.describe());
    Ok(store)
}
