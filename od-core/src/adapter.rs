// SPDX-License-Identifier: AGPL-3.0-or-later
//! Storage adapter trait

use async_trait::async_trait;

use crate::{
    content::{ByteStream, Content, Payload, WriteOutcome},
    error::AdapterResult,
    metadata::Metadata,
    operations::{ReadOptions, RemoveOptions, WriteOptions},
};

/// Storage adapter trait
///
/// The full contract a storage backend has to satisfy to sit behind a
/// [`Drive`](crate::Drive). Paths are passed through exactly as the caller
/// gave them; how they map onto storage is up to the adapter.
///
/// Adapters should report a missing file with [`AdapterError::NotFound`]
/// (or an I/O error of kind `NotFound`) so that `Drive::exists` and
/// `RemoveOptions::force` behave consistently.
///
/// [`AdapterError::NotFound`]: crate::AdapterError::NotFound
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Read a whole file. With `options.encoding` set the result is text.
    async fn read(&self, path: &str, options: &ReadOptions) -> AdapterResult<Content>;

    async fn read_metadata(&self, path: &str, options: &ReadOptions) -> AdapterResult<Metadata>;

    async fn exists(&self, path: &str, options: &ReadOptions) -> AdapterResult<bool>;

    async fn remove(&self, path: &str, options: &RemoveOptions) -> AdapterResult<()>;

    /// Store `payload` at `path`.
    ///
    /// Must fail with `AlreadyExists` when the target exists and
    /// `options.overwrite` is false, and must report whether an existing
    /// file was replaced.
    async fn write(&self, path: &str, payload: Payload, options: &WriteOptions) -> AdapterResult<WriteOutcome>;

    /// Open a byte stream over a file. Failures, including a missing file,
    /// are yielded as stream items rather than returned here.
    fn create_read_stream(&self, path: &str, options: &ReadOptions) -> ByteStream;
}
