// SPDX-License-Identifier: AGPL-3.0-or-later
//! Local filesystem adapter

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use od_core::{
    content::{failed, ByteStream, Content, Payload, WriteOutcome},
    error::{AdapterError, AdapterResult},
    metadata::Metadata,
    operations::{ReadOptions, RemoveOptions, WriteOptions},
    path, Adapter,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Chunk size for streamed reads
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Bytes inspected to guess a MIME type
const SNIFF_LEN: u64 = 8 * 1024;

/// Adapter storing files under a root directory
///
/// Drive paths are resolved relative to the root; `..` cannot climb out of
/// it. Writes land in a temporary sibling first and are renamed into place.
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    root: PathBuf,
}

impl LocalAdapter {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn to_real_path(&self, path: &str) -> AdapterResult<PathBuf> {
        let segments = path::segments(path)?;
        if segments.is_empty() {
            return Err(AdapterError::InvalidPath(path.to_string()));
        }

        let mut real = self.root.clone();
        for seg in segments {
            real.push(seg);
        }
        Ok(real)
    }

    /// Metadata of an existing regular file
    async fn file_metadata(&self, real: &Path, path: &str) -> AdapterResult<Metadata> {
        let meta = fs::metadata(real)
            .await
            .map_err(|e| AdapterError::from_io(path, e))?;
        if !meta.is_file() {
            return Err(AdapterError::NotAFile(path.to_string()));
        }

        let mut metadata = Metadata::new().with_size(meta.len());

        if let Ok(modified) = meta.modified() {
            metadata.modified = Some(modified.into());
        }
        if let Ok(created) = meta.created() {
            metadata.created = Some(created.into());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            metadata = metadata.with_extra("mode", meta.mode());
        }

        metadata.mime_type = sniff_mime_type(real).await;
        Ok(metadata)
    }
}

async fn sniff_mime_type(real: &Path) -> Option<String> {
    let file = fs::File::open(real).await.ok()?;
    let mut head = Vec::new();
    file.take(SNIFF_LEN).read_to_end(&mut head).await.ok()?;
    infer::get(&head).map(|kind| kind.mime_type().to_string())
}

/// Temporary sibling used while a write is in flight
fn temp_path_for(real: &Path) -> PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let name = real
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    real.with_file_name(format!(
        ".{}.{:x}{:x}.part",
        name,
        duration.as_secs(),
        duration.subsec_nanos()
    ))
}

async fn read_chunk(mut file: fs::File) -> AdapterResult<Option<(Bytes, fs::File)>> {
    let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
    let read = file.read_buf(&mut buffer).await?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some((buffer.freeze(), file)))
}

/// Create `dir` and its missing ancestors; returns the ones created, deepest first
async fn create_parents(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut missing = Vec::new();
    let mut current = Some(dir);
    while let Some(d) = current {
        if fs::try_exists(d).await? {
            break;
        }
        missing.push(d.to_path_buf());
        current = d.parent();
    }

    fs::create_dir_all(dir).await?;
    Ok(missing)
}

/// Undo `create_parents`; stops at the first directory that is no longer empty
async fn remove_created(dirs: &[PathBuf]) {
    for dir in dirs {
        if fs::remove_dir(dir).await.is_err() {
            break;
        }
    }
}

/// Drain `stream` into a new file at `temp`
async fn write_stream(temp: &Path, mut stream: ByteStream) -> AdapterResult<()> {
    let mut file = fs::File::create(temp).await?;
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl Adapter for LocalAdapter {
    async fn read(&self, path: &str, options: &ReadOptions) -> AdapterResult<Content> {
        let real = self.to_real_path(path)?;
        let meta = fs::metadata(&real)
            .await
            .map_err(|e| AdapterError::from_io(path, e))?;
        if !meta.is_file() {
            return Err(AdapterError::NotAFile(path.to_string()));
        }

        let data = fs::read(&real)
            .await
            .map_err(|e| AdapterError::from_io(path, e))?;
        Content::decode(data.into(), options.encoding)
    }

    async fn read_metadata(&self, path: &str, _options: &ReadOptions) -> AdapterResult<Metadata> {
        let real = self.to_real_path(path)?;
        self.file_metadata(&real, path).await
    }

    async fn exists(&self, path: &str, _options: &ReadOptions) -> AdapterResult<bool> {
        let real = self.to_real_path(path)?;
        match fs::metadata(&real).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AdapterError::from_io(path, e)),
        }
    }

    async fn remove(&self, path: &str, options: &RemoveOptions) -> AdapterResult<()> {
        let real = self.to_real_path(path)?;
        match fs::remove_file(&real).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && options.force => Ok(()),
            Err(e) => Err(AdapterError::from_io(path, e)),
        }
    }

    async fn write(&self, path: &str, payload: Payload, options: &WriteOptions) -> AdapterResult<WriteOutcome> {
        let real = self.to_real_path(path)?;

        let existed = match fs::metadata(&real).await {
            Ok(meta) if meta.is_dir() => return Err(AdapterError::NotAFile(path.to_string())),
            Ok(_) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(AdapterError::from_io(path, e)),
        };
        if existed && !options.overwrite {
            return Err(AdapterError::AlreadyExists(path.to_string()));
        }

        let created = match real.parent() {
            Some(parent) => create_parents(parent)
                .await
                .map_err(|e| AdapterError::from_io(path, e))?,
            None => Vec::new(),
        };

        let temp = temp_path_for(&real);
        if let Err(e) = write_stream(&temp, payload.into_stream(options.encoding)).await {
            let _ = fs::remove_file(&temp).await;
            remove_created(&created).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp, &real).await {
            let _ = fs::remove_file(&temp).await;
            remove_created(&created).await;
            return Err(AdapterError::from_io(path, e));
        }

        let metadata = self.file_metadata(&real, path).await?;
        Ok(if existed {
            WriteOutcome::replaced(metadata)
        } else {
            WriteOutcome::created(metadata)
        })
    }

    fn create_read_stream(&self, path: &str, _options: &ReadOptions) -> ByteStream {
        let real = match self.to_real_path(path) {
            Ok(real) => real,
            Err(e) => return failed(e),
        };
        let path = path.to_string();

        let opened = async move {
            fs::File::open(&real)
                .await
                .map_err(|e| AdapterError::from_io(&path, e))
        };

        let stream = futures::stream::once(opened)
            .map_ok(|file| futures::stream::try_unfold(file, read_chunk))
            .try_flatten();

        Box::pin(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use od_core::{CopyOptions, Drive, Encoding, MemoryAdapter, OperationKind};

    fn adapter() -> (tempfile::TempDir, LocalAdapter) {
        let dir = tempfile::tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path());
        (dir, adapter)
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (dir, adapter) = adapter();

        let outcome = adapter
            .write("notes/a.txt", Payload::from("hello"), &WriteOptions::default())
            .await
            .unwrap();
        assert!(!outcome.overwritten);
        assert_eq!(outcome.metadata.size, Some(5));
        assert!(outcome.metadata.modified.is_some());
        assert_eq!(std::fs::read(dir.path().join("notes/a.txt")).unwrap(), b"hello");

        let content = adapter
            .read("notes/a.txt", &ReadOptions::with_encoding(Encoding::Utf8))
            .await
            .unwrap();
        assert_eq!(content.as_text(), Some("hello"));
    }

    #[tokio::test]
    async fn test_overwrite_flag() {
        let (_dir, adapter) = adapter();
        adapter
            .write("a.txt", Payload::from("one"), &WriteOptions::default())
            .await
            .unwrap();

        let err = adapter
            .write("a.txt", Payload::from("two"), &WriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::AlreadyExists(_)));

        let outcome = adapter
            .write("a.txt", Payload::from("two"), &WriteOptions::overwrite())
            .await
            .unwrap();
        assert!(outcome.overwritten);
        let content = adapter.read("a.txt", &ReadOptions::default()).await.unwrap();
        assert_eq!(content.as_bytes(), b"two");
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_nothing_behind() {
        let (dir, adapter) = adapter();
        let stream = futures::stream::iter(vec![
            Ok(Bytes::from("partial")),
            Err(AdapterError::NotFound("source.txt".into())),
        ]);

        let err = adapter
            .write("a.txt", Payload::stream(stream), &WriteOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_removes_created_parents() {
        let (dir, adapter) = adapter();
        std::fs::create_dir(dir.path().join("keep")).unwrap();
        let failing = || {
            Payload::stream(futures::stream::iter(vec![Err::<Bytes, _>(
                AdapterError::NotFound("source.csv".into()),
            )]))
        };

        adapter
            .write("archive/2024/x.csv", failing(), &WriteOptions::default())
            .await
            .unwrap_err();
        assert!(!dir.path().join("archive").exists());

        adapter
            .write("keep/new/x.csv", failing(), &WriteOptions::default())
            .await
            .unwrap_err();
        assert!(dir.path().join("keep").is_dir());
        assert!(!dir.path().join("keep/new").exists());
    }

    #[tokio::test]
    async fn test_copy_from_missing_file_leaves_no_directories() {
        let (dir, local) = adapter();
        let disk = Drive::new("disk", local);
        let scratch = Drive::new("scratch", MemoryAdapter::new());

        let err = scratch
            .copy("ghost.csv", &disk, &CopyOptions::rename("archive/x.csv"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), OperationKind::Write);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_exists_and_remove() {
        let (dir, adapter) = adapter();
        let options = ReadOptions::default();
        assert!(!adapter.exists("a.txt", &options).await.unwrap());

        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        assert!(adapter.exists("a.txt", &options).await.unwrap());
        assert!(!adapter.exists("sub", &options).await.unwrap());

        adapter.remove("a.txt", &RemoveOptions::default()).await.unwrap();
        assert!(!dir.path().join("a.txt").exists());

        let err = adapter.remove("a.txt", &RemoveOptions::default()).await.unwrap_err();
        assert!(err.is_not_found());
        adapter.remove("a.txt", &RemoveOptions { force: true }).await.unwrap();
    }

    #[tokio::test]
    async fn test_paths_stay_under_root() {
        let (_dir, adapter) = adapter();
        let err = adapter
            .read("../../etc/passwd", &ReadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidPath(_)));

        let err = adapter
            .write("/", Payload::from("x"), &WriteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_read_directory_is_not_a_file() {
        let (dir, adapter) = adapter();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let err = adapter.read("sub", &ReadOptions::default()).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotAFile(_)));
        let err = adapter
            .read_metadata("sub", &ReadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotAFile(_)));
    }

    #[tokio::test]
    async fn test_metadata_sniffs_mime_type() {
        let (dir, adapter) = adapter();
        let pdf = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n";
        std::fs::write(dir.path().join("doc.pdf"), pdf).unwrap();

        let metadata = adapter
            .read_metadata("doc.pdf", &ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(metadata.size, Some(pdf.len() as u64));
        assert_eq!(metadata.mime_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_read_stream_in_chunks() {
        let (dir, adapter) = adapter();
        let data = vec![3u8; READ_CHUNK_SIZE * 2 + 1];
        std::fs::write(dir.path().join("big.bin"), &data).unwrap();

        let chunks: Vec<Bytes> = adapter
            .create_read_stream("big.bin", &ReadOptions::default())
            .try_collect()
            .await
            .unwrap();

        assert!(chunks.len() >= 3);
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_read_stream_missing_file() {
        let (_dir, adapter) = adapter();
        let mut stream = adapter.create_read_stream("ghost.bin", &ReadOptions::default());

        let first = stream.next().await.unwrap();
        assert!(first.unwrap_err().is_not_found());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_copy_and_move_between_memory_and_disk() {
        let (dir, local) = adapter();
        let disk = Drive::new("disk", local);
        let memory = MemoryAdapter::with_files([("report.csv", "a,b\n1,2\n")]).unwrap();
        let scratch = Drive::new("scratch", memory.clone());

        let file = scratch
            .copy("report.csv", &disk, &CopyOptions::rename("archive/report.csv"))
            .await
            .unwrap();
        assert_eq!(file.name(), "archive/report.csv");
        assert_eq!(
            std::fs::read(dir.path().join("archive/report.csv")).unwrap(),
            b"a,b\n1,2\n"
        );

        disk.move_to("archive/report.csv", &scratch, &CopyOptions::rename("back.csv"))
            .await
            .unwrap();
        assert!(!dir.path().join("archive/report.csv").exists());
        assert_eq!(memory.get("back.csv"), Some(Bytes::from("a,b\n1,2\n")));
    }

    #[tokio::test]
    async fn test_copy_from_missing_file_is_write_error() {
        let (_dir, local) = adapter();
        let disk = Drive::new("disk", local);
        let scratch = Drive::new("scratch", MemoryAdapter::new());

        let err = disk
            .copy("ghost.txt", &scratch, &CopyOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), OperationKind::Write);
        assert!(err.cause().is_not_found());
    }
}
