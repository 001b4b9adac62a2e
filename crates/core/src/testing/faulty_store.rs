//! Object store wrapper that injects failures.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    GetOptions, GetResult, GetResultPayload, ListResult, MultipartUpload, ObjectMeta,
    ObjectStore, PutMultipartOpts, PutOptions, PutPayload, PutResult, Result, UploadPart,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory store whose lookups, reads and part uploads can be made to fail.
///
/// Every multipart upload it hands out counts its aborts, so tests can check
/// that a failed copy cleaned up after itself.
///
/// # Example
///
/// ```rust,ignore
/// use opsbatch_core::testing::FaultyStore;
///
/// let destination = Arc::new(FaultyStore::new());
/// destination.fail_part_uploads();
///
/// assert!(copier.copy(&job).await.is_err());
/// assert_eq!(destination.abort_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemory,
    fail_head: AtomicBool,
    fail_reads: AtomicBool,
    fail_parts: AtomicBool,
    aborts: Arc<AtomicUsize>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `head` returns a generic error instead of the object's metadata.
    pub fn fail_head(&self) {
        self.fail_head.store(true, Ordering::SeqCst);
    }

    /// `get` streams half of the object and then errors.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Every part upload of a multipart upload errors.
    pub fn fail_part_uploads(&self) {
        self.fail_parts.store(true, Ordering::SeqCst);
    }

    /// Number of multipart uploads aborted so far.
    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

fn injected(operation: &str) -> object_store::Error {
    object_store::Error::Generic {
        store: "FaultyStore",
        source: format!("injected {} failure", operation).into(),
    }
}

impl fmt::Display for FaultyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaultyStore({})", self.inner)
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put_opts(
        &self,
        location: &Path,
        payload: PutPayload,
        opts: PutOptions,
    ) -> Result<PutResult> {
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &Path,
        opts: PutMultipartOpts,
    ) -> Result<Box<dyn MultipartUpload>> {
        let inner = self.inner.put_multipart_opts(location, opts).await?;
        Ok(Box::new(TrackedUpload {
            inner,
            fail_parts: self.fail_parts.load(Ordering::SeqCst),
            aborts: self.aborts.clone(),
        }))
    }

    async fn get_opts(&self, location: &Path, options: GetOptions) -> Result<GetResult> {
        let result = self.inner.get_opts(location, options).await?;
        if !self.fail_reads.load(Ordering::SeqCst) {
            return Ok(result);
        }

        let meta = result.meta.clone();
        let range = result.range.clone();
        let attributes = result.attributes.clone();
        let data = result.bytes().await?;
        let head = data.slice(..data.len() / 2);
        let chunks: Vec<Result<Bytes>> = vec![Ok(head), Err(injected("read"))];

        Ok(GetResult {
            payload: GetResultPayload::Stream(stream::iter(chunks).boxed()),
            meta,
            range,
            attributes,
        })
    }

    async fn head(&self, location: &Path) -> Result<ObjectMeta> {
        if self.fail_head.load(Ordering::SeqCst) {
            return Err(injected("head"));
        }
        self.inner.head(location).await
    }

    async fn delete(&self, location: &Path) -> Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&Path>) -> BoxStream<'_, Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&Path>) -> Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

#[derive(Debug)]
struct TrackedUpload {
    inner: Box<dyn MultipartUpload>,
    fail_parts: bool,
    aborts: Arc<AtomicUsize>,
}

#[async_trait]
impl MultipartUpload for TrackedUpload {
    fn put_part(&mut self, data: PutPayload) -> UploadPart {
        if self.fail_parts {
            return Box::pin(futures::future::ready(Err(injected("put_part"))));
        }
        self.inner.put_part(data)
    }

    async fn complete(&mut self) -> Result<PutResult> {
        self.inner.complete().await
    }

    async fn abort(&mut self) -> Result<()> {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.inner.abort().await
    }
}
