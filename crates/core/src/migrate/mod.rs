//! Object store migration.
//!
//! Copies video objects from a source store to a destination store:
//!
//! - enumerate the source lazily and keep objects whose extension is allowed
//!   and whose path date is on or after the cutoff
//! - skip keys already present at the destination (safe re-runs)
//! - stream bytes through a multipart upload, never holding a whole object
//!   in memory
//!
//! # Example
//!
//! ```ignore
//! use opsbatch_core::migrate::{build_store, Migration};
//!
//! let source = build_store(&config.migration.source()?, false)?;
//! let destination = build_store(&config.migration.destination()?, true)?;
//! let report = Migration::new(source, destination, config.migration, config.pool)?
//!     .run()
//!     .await?;
//! println!("copied {} bytes", report.bytes_copied);
//! ```

mod config;
mod copier;
mod enumerator;
mod filter;
mod runner;
mod store;

pub use config::{MigrationConfig, StoreConfig, UndatedPolicy};
pub use copier::{CopyStatus, ObjectCopier};
pub use enumerator::{CopyJob, ObjectEnumerator, ScanSnapshot, ScanStatistics};
pub use filter::{date_from_path, Eligibility, EligibilityFilter};
pub use runner::{CopyTally, Migration, MigrationPlan, MigrationReport, PlannedCopy};
pub use store::build_store;

use object_store::path::Path as ObjectPath;
use thiserror::Error;

use crate::pool::PoolError;

/// Fatal migration errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required setting is missing.
    #[error("Migration not configured: {0}")]
    NotConfigured(String),

    /// A store client could not be built.
    #[error("Failed to initialize {store} store: {source}")]
    Store {
        store: String,
        #[source]
        source: object_store::Error,
    },

    /// Local store root could not be prepared.
    #[error("Failed to prepare local store root {path}: {source}")]
    LocalRoot {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Listing the source failed part way.
    #[error("Listing source objects failed: {0}")]
    Listing(String),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Per-object copy errors. Recorded as failed items, never fatal.
#[derive(Debug, Error)]
pub enum CopyError {
    /// Existence check at the destination failed for a reason other than NotFound.
    #[error("Failed to check destination for {key}: {source}")]
    Lookup {
        key: ObjectPath,
        #[source]
        source: object_store::Error,
    },

    /// Source object could not be opened.
    #[error("Failed to open source object {key}: {source}")]
    OpenSource {
        key: ObjectPath,
        #[source]
        source: object_store::Error,
    },

    /// Reading from the source stream failed.
    #[error("Failed reading source object {key}: {source}")]
    Read {
        key: ObjectPath,
        #[source]
        source: object_store::Error,
    },

    /// Destination upload failed.
    #[error("Failed uploading {key}: {source}")]
    Upload {
        key: ObjectPath,
        #[source]
        source: object_store::Error,
    },
}
