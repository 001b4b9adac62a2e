//! Streaming object copy between two stores.

use futures::StreamExt;
use object_store::{GetResult, MultipartUpload, ObjectStore, PutPayloadMut};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use crate::metrics;

use super::config::MigrationConfig;
use super::enumerator::CopyJob;
use super::CopyError;

/// Result of a successful copy call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// Destination already had the key; nothing was transferred.
    AlreadyPresent,
    /// The object was streamed and the upload completed.
    Copied { bytes: u64 },
}

/// Copies objects from `source` to `destination` under the same key.
pub struct ObjectCopier {
    source: Arc<dyn ObjectStore>,
    destination: Arc<dyn ObjectStore>,
    part_size: usize,
    part_concurrency: usize,
}

impl ObjectCopier {
    pub fn new(
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
        part_size: usize,
        part_concurrency: usize,
    ) -> Self {
        Self {
            source,
            destination,
            part_size: part_size.max(1),
            part_concurrency: part_concurrency.max(1),
        }
    }

    pub fn from_config(
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
        config: &MigrationConfig,
    ) -> Self {
        Self::new(
            source,
            destination,
            config.part_size_bytes,
            config.part_concurrency,
        )
    }

    /// Whether the destination already holds `job`'s key.
    async fn exists_at_destination(&self, job: &CopyJob) -> Result<bool, CopyError> {
        match self.destination.head(&job.location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(source) => Err(CopyError::Lookup {
                key: job.location.clone(),
                source,
            }),
        }
    }

    /// Copies one object.
    ///
    /// The destination object only becomes visible when the multipart upload
    /// completes; every error path aborts the upload.
    pub async fn copy(&self, job: &CopyJob) -> Result<CopyStatus, CopyError> {
        info!("Processing: {} (dated {})", job.location, job.date);

        if self.exists_at_destination(job).await? {
            info!("  {}: already exists at destination, skipping", job.location);
            return Ok(CopyStatus::AlreadyPresent);
        }

        let source = self
            .source
            .get(&job.location)
            .await
            .map_err(|source| CopyError::OpenSource {
                key: job.location.clone(),
                source,
            })?;

        let size_mb = source.meta.size as f64 / (1024.0 * 1024.0);
        info!("  {}: copying ({:.2} MB)...", job.location, size_mb);
        let started = Instant::now();

        let mut upload = self
            .destination
            .put_multipart(&job.location)
            .await
            .map_err(|source| CopyError::Upload {
                key: job.location.clone(),
                source,
            })?;

        let bytes = match self.upload_parts(job, source, upload.as_mut()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                abort(upload, job).await;
                return Err(e);
            }
        };

        if let Err(source) = upload.complete().await {
            abort(upload, job).await;
            return Err(CopyError::Upload {
                key: job.location.clone(),
                source,
            });
        }

        metrics::BYTES_COPIED.inc_by(bytes);
        info!(
            "  {}: copied {} bytes in {:.1}s",
            job.location,
            bytes,
            started.elapsed().as_secs_f64()
        );

        Ok(CopyStatus::Copied { bytes })
    }

    /// Streams `source` into `upload` in parts of at least `part_size` bytes,
    /// keeping at most `part_concurrency` parts in flight.
    ///
    /// Returns once every part has been acknowledged. On error the caller
    /// owns the abort; in-flight parts are cancelled when the set drops.
    async fn upload_parts(
        &self,
        job: &CopyJob,
        source: GetResult,
        upload: &mut dyn MultipartUpload,
    ) -> Result<u64, CopyError> {
        let upload_error = |source: object_store::Error| CopyError::Upload {
            key: job.location.clone(),
            source,
        };

        let mut chunks = source.into_stream();
        let mut in_flight: JoinSet<object_store::Result<()>> = JoinSet::new();
        let mut buffer = PutPayloadMut::new();
        let mut bytes = 0u64;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|source| CopyError::Read {
                key: job.location.clone(),
                source,
            })?;
            bytes += chunk.len() as u64;
            buffer.push(chunk);

            if buffer.content_length() >= self.part_size {
                while in_flight.len() >= self.part_concurrency {
                    if let Some(done) = in_flight.join_next().await {
                        part_result(done).map_err(upload_error)?;
                    }
                }
                let part = std::mem::replace(&mut buffer, PutPayloadMut::new()).freeze();
                in_flight.spawn(upload.put_part(part));
            }
        }

        if buffer.content_length() > 0 {
            in_flight.spawn(upload.put_part(buffer.freeze()));
        }

        while let Some(done) = in_flight.join_next().await {
            part_result(done).map_err(upload_error)?;
        }

        Ok(bytes)
    }
}

fn part_result(
    done: Result<object_store::Result<()>, JoinError>,
) -> object_store::Result<()> {
    done.map_err(|e| object_store::Error::Generic {
        store: "copier",
        source: Box::new(e),
    })?
}

async fn abort(mut upload: Box<dyn MultipartUpload>, job: &CopyJob) {
    if let Err(e) = upload.abort().await {
        warn!("Failed to abort upload of {}: {}", job.location, e);
    }
}
