//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from ud-core.
//! Objects above the configured part size are moved as multipart uploads or
//! ranged downloads, with up to `max_concurrency` parts in flight.

use std::io::SeekFrom;
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_smithy_types::byte_stream::Length;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use ud_core::{
    Credentials, Error, ListResult, ObjectInfo, ObjectStore, ProgressSink, Result, TransferConfig,
};

use crate::multipart::{Part, plan_parts};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from resolved credentials
    pub async fn new(credentials: &Credentials) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(credentials.region.clone()));

        // Without static keys the SDK's default credential chain applies
        if let Some((access_key, secret_key)) = credentials.static_keys() {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "s3updown-static-credentials",
            ));
        }

        if let Some(endpoint) = &credentials.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(credentials.path_style)
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    async fn download_single(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut body = response.body;
        let mut written = 0;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress.on_bytes(chunk.len() as u64);
        }
        file.flush().await?;

        Ok(written)
    }

    async fn download_ranged(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
        size: u64,
        config: &TransferConfig,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        let file = tokio::fs::File::create(dest).await?;
        file.set_len(size).await?;
        drop(file);

        let parts = plan_parts(size, config.effective_part_size(size));
        tracing::debug!(key, parts = parts.len(), "ranged download");

        stream::iter(parts.into_iter().map(Ok::<_, Error>))
            .try_for_each_concurrent(config.max_concurrency, |part| async move {
                self.download_part(bucket, key, dest, part, progress).await
            })
            .await?;

        Ok(size)
    }

    async fn download_part(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
        part: Part,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .range(part.range_header())
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        let mut file = tokio::fs::OpenOptions::new().write(true).open(dest).await?;
        file.seek(SeekFrom::Start(part.start)).await?;

        let mut body = response.body;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            progress.on_bytes(chunk.len() as u64);
        }
        file.flush().await?;

        tracing::debug!(key, part = part.number, "downloaded part");
        Ok(())
    }

    async fn upload_single(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        size: u64,
        content_type: Option<String>,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        let body = ByteStream::from_path(src)
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .set_content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        progress.on_bytes(size);
        Ok(size)
    }

    #[allow(clippy::too_many_arguments)]
    async fn upload_multipart(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        size: u64,
        content_type: Option<String>,
        config: &TransferConfig,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        let target = format!("{bucket}/{key}");
        let create = self
            .inner
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(e, &target))?;

        let upload_id = create
            .upload_id()
            .ok_or_else(|| Error::Network(format!("No upload id returned for {target}")))?
            .to_string();

        let upload = async {
            let parts = self
                .upload_parts(src, bucket, key, &upload_id, size, config, progress)
                .await?;
            self.complete_upload(bucket, key, &upload_id, parts).await
        };
        abort_on_error(upload, self.abort_upload(bucket, key, &upload_id)).await?;

        Ok(size)
    }

    async fn complete_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<()> {
        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        self.inner
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn upload_parts(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        upload_id: &str,
        size: u64,
        config: &TransferConfig,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<CompletedPart>> {
        let parts = plan_parts(size, config.effective_part_size(size));
        tracing::debug!(key, parts = parts.len(), "multipart upload");

        let mut completed: Vec<CompletedPart> = stream::iter(parts)
            .map(|part| self.upload_part(src, bucket, key, upload_id, part, progress))
            .buffer_unordered(config.max_concurrency)
            .try_collect()
            .await?;

        completed.sort_by_key(|p| p.part_number());
        Ok(completed)
    }

    async fn upload_part(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part: Part,
        progress: &dyn ProgressSink,
    ) -> Result<CompletedPart> {
        let body = ByteStream::read_from()
            .path(src)
            .offset(part.start)
            .length(Length::Exact(part.size()))
            .build()
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let response = self
            .inner
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part.number)
            .body(body)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        progress.on_bytes(part.size());
        tracing::debug!(key, part = part.number, "uploaded part");

        Ok(CompletedPart::builder()
            .part_number(part.number)
            .set_e_tag(response.e_tag().map(str::to_owned))
            .build())
    }

    async fn abort_upload(&self, bucket: &str, key: &str, upload_id: &str) {
        let result = self
            .inner
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await;

        if let Err(e) = result {
            tracing::warn!(key, upload_id, "Failed to abort multipart upload: {}", DisplayErrorContext(&e));
        }
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn object_exists(&self, bucket: &str, prefix: &str) -> Result<bool> {
        let response = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{prefix}")))?;

        Ok(!response.contents().is_empty())
    }

    async fn object_size(&self, bucket: &str, key: &str) -> Result<u64> {
        let response = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{key}")))?;

        Ok(response.content_length().unwrap_or(0).max(0) as u64)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListResult> {
        let response = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| classify(e, &format!("{bucket}/{prefix}")))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let size = object.size().unwrap_or(0).max(0) as u64;
                ObjectInfo::file(object.key().unwrap_or_default(), size)
            })
            .collect();

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn download_object(
        &self,
        bucket: &str,
        key: &str,
        size: u64,
        dest: &Path,
        config: &TransferConfig,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        let result = if config.is_single_part(size) {
            self.download_single(bucket, key, dest, progress).await
        } else {
            self.download_ranged(bucket, key, dest, size, config, progress)
                .await
        };

        if result.is_err() {
            // Partial downloads are not resumable
            if let Err(e) = tokio::fs::remove_file(dest).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(path = %dest.display(), "Failed to remove partial download: {e}");
            }
        }

        result
    }

    async fn upload_object(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        config: &TransferConfig,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        let size = tokio::fs::metadata(src)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::NotFound(src.display().to_string()),
                _ => Error::Io(e),
            })?
            .len();

        let content_type = mime_guess::from_path(src)
            .first()
            .map(|m| m.essence_str().to_string());

        if config.is_single_part(size) {
            self.upload_single(src, bucket, key, size, content_type, progress)
                .await
        } else {
            self.upload_multipart(src, bucket, key, size, content_type, config, progress)
                .await
        }
    }
}

/// Await `work`; if it fails, run `abort` before handing the error back
async fn abort_on_error<T>(
    work: impl Future<Output = Result<T>>,
    abort: impl Future<Output = ()>,
) -> Result<T> {
    let result = work.await;
    if result.is_err() {
        abort.await;
    }
    result
}

/// Map an SDK failure onto the transfer error taxonomy
fn classify<E>(err: SdkError<E, HttpResponse>, resource: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.code().map(str::to_owned);
    tracing::debug!(resource, ?status, ?code, "S3 request failed");

    match ErrorClass::of(code.as_deref(), status) {
        ErrorClass::NotFound => Error::NotFound(resource.to_string()),
        ErrorClass::Auth => Error::Auth(DisplayErrorContext(&err).to_string()),
        ErrorClass::Other => Error::Network(DisplayErrorContext(&err).to_string()),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ErrorClass {
    NotFound,
    Auth,
    Other,
}

impl ErrorClass {
    fn of(code: Option<&str>, status: Option<u16>) -> Self {
        match (code, status) {
            (Some("NoSuchKey" | "NoSuchBucket" | "NotFound"), _) | (_, Some(404)) => Self::NotFound,
            (
                Some(
                    "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"
                    | "ExpiredToken" | "InvalidToken",
                ),
                _,
            )
            | (_, Some(401 | 403)) => Self::Auth,
            _ => Self::Other,
        }
    }
}
