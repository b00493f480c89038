// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory adapter

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::TryStreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{
    adapter::Adapter,
    content::{chunked, ByteStream, Content, Payload, WriteOutcome},
    error::{AdapterError, AdapterResult},
    metadata::Metadata,
    operations::{ReadOptions, RemoveOptions, WriteOptions},
    path,
};

/// Chunk size used by `create_read_stream`
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
struct StoredFile {
    data: Bytes,
    metadata: Metadata,
}

/// Map-backed adapter. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryAdapter {
    files: Arc<RwLock<HashMap<String, StoredFile>>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial files
    pub fn with_files<I, S, B>(files: I) -> AdapterResult<Self>
    where
        I: IntoIterator<Item = (S, B)>,
        S: AsRef<str>,
        B: Into<Bytes>,
    {
        let adapter = Self::new();
        {
            let mut map = adapter.files.write();
            for (name, data) in files {
                let data = data.into();
                let metadata = describe(&data, None);
                map.insert(path::normalize(name.as_ref())?, StoredFile { data, metadata });
            }
        }
        Ok(adapter)
    }

    pub fn contains(&self, path: &str) -> bool {
        path::normalize(path)
            .map(|key| self.files.read().contains_key(&key))
            .unwrap_or(false)
    }

    /// Stored bytes for a path
    pub fn get(&self, path: &str) -> Option<Bytes> {
        let key = path::normalize(path).ok()?;
        self.files.read().get(&key).map(|f| f.data.clone())
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    /// Stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lookup(&self, path: &str) -> AdapterResult<StoredFile> {
        let key = path::normalize(path)?;
        self.files
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| AdapterError::NotFound(path.to_string()))
    }
}

impl fmt::Debug for MemoryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAdapter")
            .field("files", &self.len())
            .finish()
    }
}

/// Build metadata for freshly stored bytes
fn describe(data: &Bytes, created: Option<chrono::DateTime<Utc>>) -> Metadata {
    let now = Utc::now();
    let mut metadata = Metadata::new()
        .with_size(data.len() as u64)
        .with_created(created.unwrap_or(now))
        .with_modified(now)
        .with_extra("blake3", blake3::hash(data).to_hex().to_string());

    if let Some(kind) = infer::get(data) {
        metadata.mime_type = Some(kind.mime_type().to_string());
    }
    metadata
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn read(&self, path: &str, options: &ReadOptions) -> AdapterResult<Content> {
        let file = self.lookup(path)?;
        Content::decode(file.data, options.encoding)
    }

    async fn read_metadata(&self, path: &str, _options: &ReadOptions) -> AdapterResult<Metadata> {
        Ok(self.lookup(path)?.metadata)
    }

    async fn exists(&self, path: &str, _options: &ReadOptions) -> AdapterResult<bool> {
        let key = path::normalize(path)?;
        Ok(self.files.read().contains_key(&key))
    }

    async fn remove(&self, path: &str, options: &RemoveOptions) -> AdapterResult<()> {
        let key = path::normalize(path)?;
        let removed = self.files.write().remove(&key);
        if removed.is_none() && !options.force {
            return Err(AdapterError::NotFound(path.to_string()));
        }
        Ok(())
    }

    async fn write(&self, path: &str, payload: Payload, options: &WriteOptions) -> AdapterResult<WriteOutcome> {
        let key = path::normalize(path)?;
        if !options.overwrite && self.files.read().contains_key(&key) {
            return Err(AdapterError::AlreadyExists(path.to_string()));
        }

        let data = payload.collect(options.encoding).await?;

        let mut files = self.files.write();
        let previous = files.get(&key).map(|f| f.metadata.created);
        if previous.is_some() && !options.overwrite {
            // Another writer got there while the payload was draining
            return Err(AdapterError::AlreadyExists(path.to_string()));
        }

        let metadata = describe(&data, previous.flatten());
        files.insert(key, StoredFile { data, metadata: metadata.clone() });

        Ok(if previous.is_some() {
            WriteOutcome::replaced(metadata)
        } else {
            WriteOutcome::created(metadata)
        })
    }

    fn create_read_stream(&self, path: &str, _options: &ReadOptions) -> ByteStream {
        let adapter = self.clone();
        let path = path.to_string();

        let stream = futures::stream::once(async move {
            let file = adapter.lookup(&path)?;
            Ok::<_, AdapterError>(chunked(file.data, STREAM_CHUNK_SIZE))
        })
        .try_flatten();

        Box::pin(stream)
    }
}
