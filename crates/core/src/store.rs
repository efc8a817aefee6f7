//! ObjectStore trait definition
//!
//! This trait defines the storage operations a transfer needs. It keeps the
//! transfer logic decoupled from the S3 SDK, and lets tests run against an
//! in-memory store.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt};
use crate::error::{Error, Result};
use crate::policy::TransferConfig;
use crate::progress::ProgressSink;

/// Metadata for a listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: u64,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a file
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes: size,
        }
    }

    /// Zero-byte objects stand in for folders and carry no data
    pub fn is_marker(&self) -> bool {
        self.size_bytes == 0
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    /// Listed objects
    pub items: Vec<ObjectInfo>,

    /// Whether the result is truncated (more items available)
    pub truncated: bool,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,
}

/// Trait for S3-compatible storage operations
///
/// Multipart chunking and part concurrency are the implementation's concern;
/// callers only pass the [`TransferConfig`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether at least one object starts with `prefix`
    async fn object_exists(&self, bucket: &str, prefix: &str) -> Result<bool>;

    /// Size of an object; `Error::NotFound` if the key does not exist
    async fn object_size(&self, bucket: &str, key: &str) -> Result<u64>;

    /// List one page of objects under `prefix`, recursively
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListResult>;

    /// Download one object of `size` bytes to `dest`, returning the number
    /// of bytes written.
    ///
    /// The size comes from [`ObjectStore::object_size`] or a listing, so the
    /// store need not look it up again.
    async fn download_object(
        &self,
        bucket: &str,
        key: &str,
        size: u64,
        dest: &Path,
        config: &TransferConfig,
        progress: &dyn ProgressSink,
    ) -> Result<u64>;

    /// Upload one local file to `key`, returning the number of bytes sent
    async fn upload_object(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        config: &TransferConfig,
        progress: &dyn ProgressSink,
    ) -> Result<u64>;
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazily enumerate every object under `prefix`, page by page
pub fn list_all<'a, S>(
    store: &'a S,
    bucket: &'a str,
    prefix: &'a str,
) -> impl Stream<Item = Result<ObjectInfo>> + 'a
where
    S: ObjectStore + ?Sized,
{
    stream::try_unfold(Cursor::Start, move |cursor| async move {
        let token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return Ok::<_, Error>(None),
        };

        let page = store.list_objects(bucket, prefix, token).await?;
        tracing::debug!(prefix, items = page.items.len(), truncated = page.truncated, "listed page");

        let next = match (page.truncated, page.continuation_token) {
            (true, Some(token)) => Cursor::Next(token),
            _ => Cursor::Done,
        };
        let items = stream::iter(page.items.into_iter().map(Ok::<_, Error>));
        Ok(Some((items, next)))
    })
    .try_flatten()
}
