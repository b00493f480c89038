// SPDX-License-Identifier: AGPL-3.0-or-later
//! File handles

use crate::{
    content::{ByteStream, Content},
    drive::Drive,
    error::FsResult,
    metadata::Metadata,
    operations::{CopyOptions, MoveOptions, ReadOptions, RemoveOptions},
};

/// A path on a drive plus the metadata seen when the handle was made
///
/// The metadata is a snapshot and is never refreshed; call
/// [`Drive::get`] for a current one. Handles never change: copying or
/// moving yields a new `File`.
#[derive(Debug, Clone)]
pub struct File {
    drive: Drive,
    name: String,
    info: Metadata,
}

impl File {
    pub fn new(drive: Drive, name: impl Into<String>, info: Metadata) -> Self {
        Self {
            drive,
            name: name.into(),
            info,
        }
    }

    /// Path of the file on its drive
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &Metadata {
        &self.info
    }

    pub fn drive(&self) -> &Drive {
        &self.drive
    }

    pub async fn read(&self, options: &ReadOptions) -> FsResult<Content> {
        self.drive.read(&self.name, options).await
    }

    pub async fn remove(&self, options: &RemoveOptions) -> FsResult<()> {
        self.drive.remove(&self.name, options).await
    }

    pub fn create_read_stream(&self, options: &ReadOptions) -> ByteStream {
        self.drive.create_read_stream(&self.name, options)
    }

    pub async fn copy_to(&self, destination: &Drive, options: &CopyOptions) -> FsResult<File> {
        self.drive.copy(&self.name, destination, options).await
    }

    pub async fn move_to(&self, destination: &Drive, options: &MoveOptions) -> FsResult<File> {
        self.drive.move_to(&self.name, destination, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Encoding, FileSystemError, MemoryAdapter, WriteOptions};
    use bytes::Bytes;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_read_and_stream() {
        let drive = Drive::new("mem", MemoryAdapter::new());
        let file = drive.write("a.txt", "hello", &WriteOptions::default()).await.unwrap();

        let text = file.read(&ReadOptions::with_encoding(Encoding::Utf8)).await.unwrap();
        assert_eq!(text.as_text(), Some("hello"));

        let chunks: Vec<Bytes> = file
            .create_read_stream(&ReadOptions::default())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"hello".to_vec());
    }

    #[tokio::test]
    async fn test_info_is_a_snapshot() {
        let drive = Drive::new("mem", MemoryAdapter::new());
        let file = drive.write("a.txt", "short", &WriteOptions::default()).await.unwrap();
        drive.put("a.txt", "much longer now", &WriteOptions::default()).await.unwrap();

        assert_eq!(file.info().size, Some(5));
        let fresh = drive.get(file.name(), &ReadOptions::default()).await.unwrap();
        assert_eq!(fresh.info().size, Some(15));
    }

    #[tokio::test]
    async fn test_remove() {
        let memory = MemoryAdapter::new();
        let drive = Drive::new("mem", memory.clone());
        let file = drive.write("a.txt", "x", &WriteOptions::default()).await.unwrap();

        file.remove(&RemoveOptions::default()).await.unwrap();
        assert!(!memory.contains("a.txt"));

        let err = file.remove(&RemoveOptions::default()).await.unwrap_err();
        assert!(matches!(err, FileSystemError::RemoveFile { .. }));
    }

    #[tokio::test]
    async fn test_copy_to_returns_new_handle() {
        let source = Drive::new("src", MemoryAdapter::new());
        let destination = Drive::new("dst", MemoryAdapter::new());
        let file = source.write("a.txt", "x", &WriteOptions::default()).await.unwrap();

        let copy = file.copy_to(&destination, &CopyOptions::rename("b.txt")).await.unwrap();

        assert_eq!(file.name(), "a.txt");
        assert_eq!(file.drive().id(), "src");
        assert_eq!(copy.name(), "b.txt");
        assert_eq!(copy.drive().id(), "dst");
    }

    #[tokio::test]
    async fn test_move_to() {
        let source_memory = MemoryAdapter::new();
        let source = Drive::new("src", source_memory.clone());
        let destination = Drive::new("dst", MemoryAdapter::new());
        let file = source.write("a.txt", "x", &WriteOptions::default()).await.unwrap();

        let moved = file.move_to(&destination, &MoveOptions::default()).await.unwrap();

        assert!(source_memory.is_empty());
        assert_eq!(moved.read(&ReadOptions::default()).await.unwrap().as_bytes(), b"x");

        // the old handle still points at the now missing source
        let err = file.read(&ReadOptions::default()).await.unwrap_err();
        assert_eq!(err.path(), "a.txt");
    }
}
