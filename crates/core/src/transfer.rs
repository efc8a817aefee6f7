//! File and folder transfers
//!
//! [`Transferer`] turns a [`TransferJob`] into one or more single-object
//! transfers on an [`ObjectStore`]. Files are moved strictly one after another;
//! the first failure aborts the rest of the queue.

use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::str::FromStr;

use futures::TryStreamExt;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path;
use crate::policy::TransferConfig;
use crate::progress::ProgressReporter;
use crate::store::{ObjectStore, list_all};

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upload,
    Download,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(Self::Upload),
            "down" => Ok(Self::Download),
            _ => Err(Error::InvalidArgument(format!(
                "updown must be 'up' or 'down', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => write!(f, "upload"),
            Self::Download => write!(f, "download"),
        }
    }
}

/// Transfer unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    File,
    Folder,
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(Self::File),
            "folder" => Ok(Self::Folder),
            _ => Err(Error::InvalidArgument(format!(
                "filefolder must be 'file' or 'folder', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Folder => write!(f, "folder"),
        }
    }
}

/// A single invocation: what to move, where, and how
#[derive(Debug, Clone)]
pub struct TransferJob {
    /// Local path (upload) or remote key/prefix (download)
    pub source: String,
    /// Remote prefix (upload) or local directory (download)
    pub destination: String,
    pub direction: Direction,
    pub kind: Kind,
}

/// A local file scheduled for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub local_path: PathBuf,
    pub remote_key: String,
    pub size_bytes: u64,
}

/// Outcome of a completed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub direction: Direction,
    pub kind: Kind,
    /// Files transferred
    pub files: usize,
    /// Zero-byte objects skipped during a folder download
    pub skipped: usize,
    /// Bytes transferred
    pub bytes: u64,
}

impl TransferSummary {
    fn new(direction: Direction, kind: Kind) -> Self {
        Self {
            direction,
            kind,
            files: 0,
            skipped: 0,
            bytes: 0,
        }
    }

    fn record(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
    }
}

/// Runs transfers between the local filesystem and one bucket
pub struct Transferer<S, R> {
    store: S,
    reporter: R,
    bucket: String,
    config: TransferConfig,
}

impl<S, R> Transferer<S, R>
where
    S: ObjectStore,
    R: ProgressReporter,
{
    pub fn new(store: S, reporter: R, bucket: impl Into<String>, config: TransferConfig) -> Self {
        Self {
            store,
            reporter,
            bucket: bucket.into(),
            config,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Execute a job
    pub async fn run(&self, job: &TransferJob) -> Result<TransferSummary> {
        let src = job.source.as_str();
        let dst = job.destination.as_str();
        match (job.direction, job.kind) {
            (Direction::Upload, Kind::File) => self.upload_file(Path::new(src), dst).await,
            (Direction::Upload, Kind::Folder) => self.upload_folder(Path::new(src), dst).await,
            (Direction::Download, Kind::File) => self.download_file(src, Path::new(dst)).await,
            (Direction::Download, Kind::Folder) => {
                self.download_folder(src, Path::new(dst)).await
            }
        }
    }

    /// Download one object into `dest_dir`, keeping its base name
    pub async fn download_file(&self, src_key: &str, dest_dir: &Path) -> Result<TransferSummary> {
        let size = self.store.object_size(&self.bucket, src_key).await?;
        let target = path::absolute(dest_dir)?.join(path::remote_basename(src_key));

        let mut summary = TransferSummary::new(Direction::Download, Kind::File);
        summary.record(self.download_one(src_key, size, &target).await?);
        Ok(summary)
    }

    /// Download every non-empty object under a prefix.
    ///
    /// Each object lands at `dest_dir/<object key>`. Zero-byte objects are
    /// folder markers and are skipped.
    pub async fn download_folder(
        &self,
        src_prefix: &str,
        dest_dir: &Path,
    ) -> Result<TransferSummary> {
        let prefix = path::strip_trailing_separator(src_prefix);
        if !self.store.object_exists(&self.bucket, prefix).await? {
            return Err(Error::NotFound(format!("{}/{prefix}", self.bucket)));
        }

        let dest_dir = path::absolute(dest_dir)?;
        let mut summary = TransferSummary::new(Direction::Download, Kind::Folder);

        let mut objects = pin!(list_all(&self.store, &self.bucket, prefix));
        while let Some(object) = objects.try_next().await? {
            if object.is_marker() {
                tracing::debug!(key = %object.key, "skipping zero-byte object");
                summary.skipped += 1;
                continue;
            }

            let target = path::local_target(&dest_dir, &object.key)?;
            summary.record(self.download_one(&object.key, object.size_bytes, &target).await?);
        }

        Ok(summary)
    }

    /// Upload one local file under `dest_prefix`, keeping its base name
    pub async fn upload_file(&self, src_path: &Path, dest_prefix: &str) -> Result<TransferSummary> {
        let src = path::absolute(src_path)?;
        let metadata = local_metadata(&src)?;
        if metadata.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "'{}' is a directory; use --filefolder folder",
                src.display()
            )));
        }

        let key = path::join_remote(
            path::strip_trailing_separator(dest_prefix),
            &path::local_basename(&src)?,
        );

        let mut summary = TransferSummary::new(Direction::Upload, Kind::File);
        summary.record(self.upload_one(&src, &key, metadata.len()).await?);
        Ok(summary)
    }

    /// Upload every file below `src_dir` as `<dest_prefix>/<dir name>/<relative path>`
    pub async fn upload_folder(&self, src_dir: &Path, dest_prefix: &str) -> Result<TransferSummary> {
        let entries = self.enumerate(src_dir, dest_prefix)?;
        tracing::debug!(files = entries.len(), "enumerated upload folder");

        let mut summary = TransferSummary::new(Direction::Upload, Kind::Folder);
        for entry in entries {
            summary.record(
                self.upload_one(&entry.local_path, &entry.remote_key, entry.size_bytes)
                    .await?,
            );
        }
        Ok(summary)
    }

    /// Collect the files of a folder upload along with their remote keys
    pub fn enumerate(&self, src_dir: &Path, dest_prefix: &str) -> Result<Vec<FileEntry>> {
        let mut root = path::absolute(src_dir)?;
        if !local_metadata(&root)?.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "'{}' is not a directory; use --filefolder file",
                root.display()
            )));
        }
        // paths like "." or ".." carry no usable folder name until resolved
        if root.file_name().is_none() {
            root = std::fs::canonicalize(&root)?;
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.path().is_file() {
                files.push(entry.into_path());
            }
        }

        let prefix = path::strip_trailing_separator(dest_prefix);
        path::to_remote_keys(&root, files)?
            .into_iter()
            .map(|(local_path, relative_key)| {
                let size_bytes = std::fs::metadata(&local_path)?.len();
                Ok(FileEntry {
                    remote_key: path::join_remote(prefix, &relative_key),
                    local_path,
                    size_bytes,
                })
            })
            .collect()
    }

    async fn download_one(&self, key: &str, size: u64, target: &Path) -> Result<u64> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(key, target = %target.display(), size, "download file");
        let label = format!("(S3 storage) {key} -> (Local) {}", target.display());
        let sink = self.reporter.instrument(size, &label);

        let bytes = self
            .store
            .download_object(&self.bucket, key, size, target, &self.config, sink.as_ref())
            .await?;
        sink.finish();
        Ok(bytes)
    }

    async fn upload_one(&self, src: &Path, key: &str, size: u64) -> Result<u64> {
        tracing::info!(src = %src.display(), key, size, "upload file");
        let label = format!("(Local) {} -> (S3 storage) {key}", src.display());
        let sink = self.reporter.instrument(size, &label);

        let bytes = self
            .store
            .upload_object(src, &self.bucket, key, &self.config, sink.as_ref())
            .await?;
        sink.finish();
        Ok(bytes)
    }
}

fn local_metadata(path: &Path) -> Result<std::fs::Metadata> {
    std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ProgressSink, SilentReporter};
    use crate::store::{ListResult, ObjectInfo};
    use async_trait::async_trait;
    use mockall::mock;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const PAGE_SIZE: usize = 2;
    const CHUNK: usize = 4;

    /// In-memory bucket that pages listings and reports progress in small chunks
    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<BTreeMap<String, Vec<u8>>>,
        fail_key: Option<String>,
        size_lookups: AtomicUsize,
    }

    impl MemoryStore {
        fn with_objects(objects: &[(&str, &str)]) -> Self {
            let store = Self::default();
            for (key, data) in objects {
                store.put(key, data.as_bytes());
            }
            store
        }

        fn failing_on(key: &str) -> Self {
            Self {
                fail_key: Some(key.to_string()),
                ..Default::default()
            }
        }

        fn put(&self, key: &str, data: &[u8]) {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), data.to_vec());
        }

        fn get(&self, key: &str) -> Option<Vec<u8>> {
            self.objects.lock().unwrap().get(key).cloned()
        }

        fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }

        fn check(&self, key: &str) -> Result<()> {
            match &self.fail_key {
                Some(fail) if fail == key => Err(Error::Network(format!("injected failure: {key}"))),
                _ => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn object_exists(&self, _bucket: &str, prefix: &str) -> Result<bool> {
            Ok(self.keys().iter().any(|k| k.starts_with(prefix)))
        }

        async fn object_size(&self, bucket: &str, key: &str) -> Result<u64> {
            self.size_lookups.fetch_add(1, Ordering::SeqCst);
            self.get(key)
                .map(|data| data.len() as u64)
                .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
        }

        async fn list_objects(
            &self,
            _bucket: &str,
            prefix: &str,
            continuation_token: Option<String>,
        ) -> Result<ListResult> {
            let objects = self.objects.lock().unwrap();
            let mut matching = objects
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .filter(|(k, _)| continuation_token.as_ref().is_none_or(|t| *k > t));

            let items: Vec<ObjectInfo> = matching
                .by_ref()
                .take(PAGE_SIZE)
                .map(|(k, v)| ObjectInfo::file(k.clone(), v.len() as u64))
                .collect();
            let truncated = matching.next().is_some();

            Ok(ListResult {
                continuation_token: truncated.then(|| items.last().map(|i| i.key.clone())).flatten(),
                items,
                truncated,
            })
        }

        async fn download_object(
            &self,
            bucket: &str,
            key: &str,
            size: u64,
            dest: &Path,
            _config: &TransferConfig,
            progress: &dyn ProgressSink,
        ) -> Result<u64> {
            self.check(key)?;
            let data = self
                .get(key)
                .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))?;
            assert_eq!(size, data.len() as u64, "size handed to the store for {key}");
            std::fs::write(dest, &data)?;
            for chunk in data.chunks(CHUNK) {
                progress.on_bytes(chunk.len() as u64);
            }
            Ok(data.len() as u64)
        }

        async fn upload_object(
            &self,
            src: &Path,
            _bucket: &str,
            key: &str,
            _config: &TransferConfig,
            progress: &dyn ProgressSink,
        ) -> Result<u64> {
            self.check(key)?;
            let data = std::fs::read(src)?;
            for chunk in data.chunks(CHUNK) {
                progress.on_bytes(chunk.len() as u64);
            }
            self.put(key, &data);
            Ok(data.len() as u64)
        }
    }

    /// Reporter that remembers every instrumented transfer and its byte count
    #[derive(Default, Clone)]
    struct RecordingReporter {
        transfers: Arc<Mutex<Vec<(u64, String, Arc<AtomicU64>)>>>,
    }

    struct CountingSink(Arc<AtomicU64>);

    impl ProgressSink for CountingSink {
        fn on_bytes(&self, n: u64) {
            self.0.fetch_add(n, Ordering::SeqCst);
        }
    }

    impl ProgressReporter for RecordingReporter {
        fn instrument(&self, total_bytes: u64, label: &str) -> Box<dyn ProgressSink> {
            let counter = Arc::new(AtomicU64::new(0));
            self.transfers
                .lock()
                .unwrap()
                .push((total_bytes, label.to_string(), counter.clone()));
            Box::new(CountingSink(counter))
        }
    }

    mock! {
        Sink {}
        impl ProgressSink for Sink {
            fn on_bytes(&self, n: u64);
            fn finish(&self);
        }
    }

    /// Hands out one prepared mock sink
    struct MockReporter(Mutex<Option<MockSink>>);

    impl ProgressReporter for MockReporter {
        fn instrument(&self, _total_bytes: u64, _label: &str) -> Box<dyn ProgressSink> {
            Box::new(self.0.lock().unwrap().take().expect("one transfer only"))
        }
    }

    fn transferer(store: MemoryStore) -> Transferer<MemoryStore, SilentReporter> {
        Transferer::new(store, SilentReporter, "bucket", TransferConfig::default())
    }

    fn write(path: &Path, data: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    #[test]
    fn test_parse_direction_and_kind() {
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Upload);
        assert_eq!("down".parse::<Direction>().unwrap(), Direction::Download);
        assert_eq!("file".parse::<Kind>().unwrap(), Kind::File);
        assert_eq!("folder".parse::<Kind>().unwrap(), Kind::Folder);

        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!("dir".parse::<Kind>(), Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_upload_file_key_construction() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f.txt");
        write(&file, b"0123456789");

        let t = transferer(MemoryStore::default());
        t.upload_file(&file, "").await.unwrap();
        t.upload_file(&file, "a/b").await.unwrap();
        t.upload_file(&file, "c/").await.unwrap();

        assert_eq!(t.store().keys(), vec!["a/b/f.txt", "c/f.txt", "f.txt"]);
        assert_eq!(t.store().get("f.txt").unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_upload_file_missing_source() {
        let temp = TempDir::new().unwrap();
        let t = transferer(MemoryStore::default());

        let result = t.upload_file(&temp.path().join("nope.txt"), "").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upload_file_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let t = transferer(MemoryStore::default());

        let result = t.upload_file(temp.path(), "").await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_folder_round_trip() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        write(&root.join("a.txt"), b"alpha");
        write(&root.join("sub").join("b.txt"), b"bravo bravo");

        let t = transferer(MemoryStore::default());
        let up = t.upload_folder(&root, "dst").await.unwrap();
        assert_eq!(up.files, 2);
        assert_eq!(up.bytes, 16);
        assert_eq!(t.store().keys(), vec!["dst/root/a.txt", "dst/root/sub/b.txt"]);

        let out = temp.path().join("out");
        let down = t.download_folder("dst/root/", &out).await.unwrap();
        assert_eq!(down.files, 2);
        assert_eq!(down.skipped, 0);

        let a = std::fs::read(out.join("dst/root/a.txt")).unwrap();
        let b = std::fs::read(out.join("dst/root/sub/b.txt")).unwrap();
        assert_eq!(a, b"alpha");
        assert_eq!(b, b"bravo bravo");
    }

    #[tokio::test]
    async fn test_upload_folder_with_empty_prefix() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("photos");
        write(&root.join("x.jpg"), b"x");

        let t = transferer(MemoryStore::default());
        t.upload_folder(&root, "").await.unwrap();
        assert_eq!(t.store().keys(), vec!["photos/x.jpg"]);
    }

    #[tokio::test]
    async fn test_upload_folder_rejects_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f.txt");
        write(&file, b"f");

        let t = transferer(MemoryStore::default());
        let result = t.upload_folder(&file, "").await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let result = t.upload_folder(&temp.path().join("missing"), "").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upload_folder_is_fail_fast() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        write(&root.join("1.txt"), b"one");
        write(&root.join("2.txt"), b"two");
        write(&root.join("3.txt"), b"three");

        let t = transferer(MemoryStore::failing_on("root/2.txt"));
        let result = t.upload_folder(&root, "").await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(t.store().keys(), vec!["root/1.txt"]);
    }

    #[tokio::test]
    async fn test_download_folder_skips_zero_byte_objects() {
        let store = MemoryStore::with_objects(&[
            ("p/", ""),
            ("p/empty.txt", ""),
            ("p/one.txt", "11111"),
            ("p/nested/two.txt", "22"),
            ("other/three.txt", "333"),
        ]);
        let temp = TempDir::new().unwrap();

        let t = transferer(store);
        let summary = t.download_folder("p", temp.path()).await.unwrap();

        assert_eq!(summary.files, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.bytes, 7);
        assert!(temp.path().join("p/one.txt").is_file());
        assert!(temp.path().join("p/nested/two.txt").is_file());
        assert!(!temp.path().join("p/empty.txt").exists());
        assert!(!temp.path().join("other").exists());
    }

    #[tokio::test]
    async fn test_download_folder_missing_prefix() {
        let temp = TempDir::new().unwrap();
        let t = transferer(MemoryStore::with_objects(&[("a/x", "x")]));

        let result = t.download_folder("b/", temp.path()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_download_folder_is_fail_fast() {
        let store = MemoryStore {
            fail_key: Some("p/b".into()),
            ..Default::default()
        };
        store.put("p/a", b"a");
        store.put("p/b", b"b");
        store.put("p/c", b"c");
        let temp = TempDir::new().unwrap();

        let t = transferer(store);
        let result = t.download_folder("p", temp.path()).await;

        assert!(result.is_err());
        assert!(temp.path().join("p/a").exists());
        assert!(!temp.path().join("p/c").exists());
    }

    #[tokio::test]
    async fn test_download_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("new").join("dir");
        let t = transferer(MemoryStore::with_objects(&[("a/b/file.zip", "zipdata")]));

        let summary = t.download_file("a/b/file.zip", &dest).await.unwrap();

        assert_eq!(summary.files, 1);
        assert_eq!(summary.bytes, 7);
        assert_eq!(std::fs::read(dest.join("file.zip")).unwrap(), b"zipdata");
        assert_eq!(t.store().size_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_download_folder_uses_listed_sizes() {
        let temp = TempDir::new().unwrap();
        let t = transferer(MemoryStore::with_objects(&[
            ("p/a.txt", "aaa"),
            ("p/b.txt", "bb"),
            ("p/c.txt", "c"),
        ]));

        let summary = t.download_folder("p", temp.path()).await.unwrap();

        assert_eq!(summary.files, 3);
        assert_eq!(summary.bytes, 6);
        assert_eq!(t.store().size_lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_download_missing_key_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let t = transferer(MemoryStore::default());

        let result = t.download_file("missing.txt", temp.path()).await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_progress_sums_to_object_size() {
        let temp = TempDir::new().unwrap();
        let store = MemoryStore::default();
        store.put("big.bin", &[7u8; 37]);
        let reporter = RecordingReporter::default();
        let t = Transferer::new(
            store,
            reporter.clone(),
            "bucket",
            TransferConfig::default(),
        );

        t.download_file("big.bin", temp.path()).await.unwrap();

        let transfers = reporter.transfers.lock().unwrap();
        assert_eq!(transfers.len(), 1);
        let (total, label, counted) = &transfers[0];
        assert_eq!(*total, 37);
        assert!(label.contains("big.bin"));
        assert_eq!(counted.load(Ordering::SeqCst), 37);
    }

    #[tokio::test]
    async fn test_sink_finished_once_after_upload() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f.txt");
        write(&file, b"0123456789");

        let total = Arc::new(AtomicU64::new(0));
        let counter = total.clone();
        let mut sink = MockSink::new();
        sink.expect_on_bytes().returning(move |n| {
            counter.fetch_add(n, Ordering::SeqCst);
        });
        sink.expect_finish().times(1).return_const(());

        let t = Transferer::new(
            MemoryStore::default(),
            MockReporter(Mutex::new(Some(sink))),
            "bucket",
            TransferConfig::default(),
        );
        t.upload_file(&file, "").await.unwrap();

        assert_eq!(total.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_failed_transfer_does_not_finish_sink() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f.txt");
        write(&file, b"data");

        let mut sink = MockSink::new();
        sink.expect_on_bytes().never();
        sink.expect_finish().never();

        let t = Transferer::new(
            MemoryStore::failing_on("f.txt"),
            MockReporter(Mutex::new(Some(sink))),
            "bucket",
            TransferConfig::default(),
        );
        assert!(t.upload_file(&file, "").await.is_err());
    }

    #[tokio::test]
    async fn test_run_dispatches_job() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("report.csv");
        write(&file, b"a,b");

        let t = transferer(MemoryStore::default());
        let job = TransferJob {
            source: file.display().to_string(),
            destination: "reports".into(),
            direction: Direction::Upload,
            kind: Kind::File,
        };
        let summary = t.run(&job).await.unwrap();
        assert_eq!(summary.direction, Direction::Upload);
        assert_eq!(summary.kind, Kind::File);
        assert_eq!(t.store().keys(), vec!["reports/report.csv"]);

        let out = temp.path().join("out");
        let job = TransferJob {
            source: "reports/report.csv".into(),
            destination: out.display().to_string(),
            direction: Direction::Download,
            kind: Kind::File,
        };
        t.run(&job).await.unwrap();
        assert_eq!(std::fs::read(out.join("report.csv")).unwrap(), b"a,b");
    }

    #[test]
    fn test_enumerate_entries() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        write(&root.join("b.txt"), b"bb");
        write(&root.join("a").join("c.txt"), b"c");
        std::fs::create_dir_all(root.join("empty")).unwrap();

        let t = transferer(MemoryStore::default());
        let entries = t.enumerate(&root, "backup/").unwrap();

        let keys: Vec<&str> = entries.iter().map(|e| e.remote_key.as_str()).collect();
        assert_eq!(keys, vec!["backup/data/a/c.txt", "backup/data/b.txt"]);
        assert_eq!(entries[1].size_bytes, 2);
    }

    #[test]
    fn test_summary_serializes_lowercase() {
        let mut summary = TransferSummary::new(Direction::Download, Kind::Folder);
        summary.record(5);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["direction"], "download");
        assert_eq!(json["kind"], "folder");
        assert_eq!(json["files"], 1);
        assert_eq!(json["bytes"], 5);
    }
}
