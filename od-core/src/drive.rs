// SPDX-License-Identifier: AGPL-3.0-or-later
//! Drive facade over a storage adapter

use std::fmt;
use std::sync::Arc;

use crate::{
    adapter::Adapter,
    content::{ByteStream, Content, Payload, WriteOutcome},
    error::{FileSystemError, FsResult},
    file::File,
    metadata::Metadata,
    operations::{CopyOptions, MoveOptions, ReadOptions, RemoveOptions, WriteOptions},
    path::normalize,
};

/// Uniform file API bound to one adapter
///
/// A drive holds nothing but its adapter, so clones are cheap and can be
/// used from any number of tasks at once. Concurrent calls are not ordered
/// against each other: two writes to the same path race in the adapter.
#[derive(Clone)]
pub struct Drive {
    id: Arc<str>,
    adapter: Arc<dyn Adapter>,
}

impl Drive {
    pub fn new(id: impl Into<String>, adapter: impl Adapter + 'static) -> Self {
        Self::from_arc(id, Arc::new(adapter))
    }

    pub fn from_arc(id: impl Into<String>, adapter: Arc<dyn Adapter>) -> Self {
        Self {
            id: Arc::from(id.into()),
            adapter,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Create a `File` handle for `path` without touching storage.
    pub fn create_file(&self, path: impl Into<String>, metadata: Option<Metadata>) -> File {
        File::new(self.clone(), path, metadata.unwrap_or_default())
    }

    /// Read a file's content.
    pub async fn read(&self, path: &str, options: &ReadOptions) -> FsResult<Content> {
        tracing::debug!(drive = %self.id, path, "read");
        self.adapter
            .read(path, options)
            .await
            .map_err(|e| FileSystemError::read(path, e))
    }

    /// Fetch a file's metadata as a `File` handle.
    pub async fn get(&self, path: &str, options: &ReadOptions) -> FsResult<File> {
        tracing::debug!(drive = %self.id, path, "get");
        let metadata = self
            .adapter
            .read_metadata(path, options)
            .await
            .map_err(|e| FileSystemError::read(path, e))?;
        Ok(self.create_file(path, Some(metadata)))
    }

    /// Check whether a file exists.
    ///
    /// A not-found failure from the adapter means `false`. Any other adapter
    /// failure is an error: a permission or network problem says nothing
    /// about whether the file is there.
    pub async fn exists(&self, path: &str, options: &ReadOptions) -> FsResult<bool> {
        tracing::debug!(drive = %self.id, path, "exists");
        match self.adapter.exists(path, options).await {
            Ok(found) => Ok(found),
            Err(e) if e.is_not_found() => {
                tracing::debug!(drive = %self.id, path, "exists: adapter reported not found");
                Ok(false)
            }
            Err(e) => Err(FileSystemError::read(path, e)),
        }
    }

    /// Remove a file.
    pub async fn remove(&self, path: &str, options: &RemoveOptions) -> FsResult<()> {
        tracing::debug!(drive = %self.id, path, "remove");
        self.adapter
            .remove(path, options)
            .await
            .map_err(|e| FileSystemError::remove(path, e))
    }

    /// Write a file's content.
    ///
    /// Fails when the file exists unless `options.overwrite` is set.
    pub async fn write(&self, path: &str, payload: impl Into<Payload>, options: &WriteOptions) -> FsResult<File> {
        tracing::debug!(drive = %self.id, path, overwrite = options.overwrite, "write");
        let WriteOutcome { metadata, overwritten } = self
            .adapter
            .write(path, payload.into(), options)
            .await
            .map_err(|e| FileSystemError::write(path, e))?;

        if overwritten {
            tracing::debug!(drive = %self.id, path, "replaced existing file");
        }
        Ok(self.create_file(path, Some(metadata)))
    }

    /// Put or replace a file's content: `write` with `overwrite` forced on.
    pub async fn put(&self, path: &str, payload: impl Into<Payload>, options: &WriteOptions) -> FsResult<File> {
        let options = WriteOptions {
            overwrite: true,
            ..options.clone()
        };
        self.write(path, payload, &options).await
    }

    /// Open a read stream over a file.
    ///
    /// Errors are not normalized here; they arrive as stream items and must
    /// be handled where the stream is consumed.
    pub fn create_read_stream(&self, path: &str, options: &ReadOptions) -> ByteStream {
        self.adapter.create_read_stream(path, options)
    }

    /// Copy a file to another drive (or to another path on this one).
    ///
    /// The source is streamed straight into `destination.write`, at
    /// `options.rename` if given, else at `path`. A failure while reading
    /// the source therefore surfaces as a `WriteFile` error for the target
    /// path, with the source failure as its cause.
    pub async fn copy(&self, path: &str, destination: &Drive, options: &CopyOptions) -> FsResult<File> {
        let target = options.rename.as_deref().unwrap_or(path);
        tracing::debug!(
            drive = %self.id,
            path,
            destination = %destination.id,
            destination_path = target,
            "copy"
        );

        let stream = self.create_read_stream(path, &options.read_options());
        destination
            .write(target, Payload::Stream(stream), &options.write_options())
            .await
    }

    /// Move a file to another drive: copy, then remove the source.
    ///
    /// The two phases are not atomic. If the copy fails nothing is removed.
    /// If the removal fails the `RemoveFile` error is returned and the copy
    /// at the destination stays in place, so both files exist.
    ///
    /// Moving a file onto itself (same adapter, same normalized path) only
    /// runs the copy; the source is never removed.
    pub async fn move_to(&self, path: &str, destination: &Drive, options: &MoveOptions) -> FsResult<File> {
        let file = self.copy(path, destination, options).await?;

        if self.same_file(path, destination, file.name()) {
            tracing::debug!(drive = %self.id, path, "move onto itself, source kept");
            return Ok(file);
        }

        if let Err(e) = self.remove(path, &RemoveOptions::default()).await {
            tracing::warn!(
                drive = %self.id,
                path,
                destination = %destination.id,
                copied_to = file.name(),
                error = %e,
                "move copied the file but could not remove the source"
            );
            return Err(e);
        }

        Ok(file)
    }

    /// `a` on this drive and `b` on `other` name the same stored file
    fn same_file(&self, a: &str, other: &Drive, b: &str) -> bool {
        // Two drives over distinct adapter instances sharing one backing
        // store (e.g. two local roots) are not detected.
        let same_adapter = std::ptr::eq(
            Arc::as_ptr(&self.adapter) as *const u8,
            Arc::as_ptr(&other.adapter) as *const u8,
        );
        same_adapter && matches!((normalize(a), normalize(b)), (Ok(x), Ok(y)) if x == y)
    }
}

impl fmt::Debug for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drive").field("id", &self.id).finish_non_exhaustive()
    }
}
