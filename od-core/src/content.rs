// SPDX-License-Identifier: AGPL-3.0-or-later
//! Content moving in and out of adapters

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;

use crate::error::{AdapterError, AdapterResult};
use crate::metadata::Metadata;
use crate::operations::Encoding;

/// Byte stream type
pub type ByteStream = Pin<Box<dyn Stream<Item = AdapterResult<Bytes>> + Send>>;

/// Content handed to [`Adapter::write`](crate::Adapter::write)
pub enum Payload {
    Bytes(Bytes),
    Text(String),
    Stream(ByteStream),
}

impl Payload {
    /// Wrap any fallible byte stream
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = AdapterResult<Bytes>> + Send + 'static,
    {
        Payload::Stream(Box::pin(stream))
    }

    /// Convert into a byte stream; text is encoded with `encoding`.
    ///
    /// An encoding failure is yielded as the single stream item.
    pub fn into_stream(self, encoding: Option<Encoding>) -> ByteStream {
        match self {
            Payload::Bytes(bytes) => {
                Box::pin(futures::stream::once(async move { Ok::<_, AdapterError>(bytes) }))
            }
            Payload::Text(text) => {
                let encoded = encoding.unwrap_or(Encoding::Utf8).encode(&text);
                Box::pin(futures::stream::once(async move { encoded }))
            }
            Payload::Stream(stream) => stream,
        }
    }

    /// Drain the payload into one buffer.
    ///
    /// The first error from a streamed payload is returned as is.
    pub async fn collect(self, encoding: Option<Encoding>) -> AdapterResult<Bytes> {
        match self {
            Payload::Bytes(bytes) => Ok(bytes),
            Payload::Text(text) => encoding.unwrap_or(Encoding::Utf8).encode(&text),
            Payload::Stream(mut stream) => {
                let mut buffer = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buffer.extend_from_slice(&chunk?);
                }
                Ok(buffer.freeze())
            }
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Payload::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Payload::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Payload {
    fn from(bytes: &'static [u8]) -> Self {
        Payload::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<ByteStream> for Payload {
    fn from(stream: ByteStream) -> Self {
        Payload::Stream(stream)
    }
}

impl From<Content> for Payload {
    fn from(content: Content) -> Self {
        match content {
            Content::Bytes(bytes) => Payload::Bytes(bytes),
            Content::Text(text) => Payload::Text(text),
        }
    }
}

/// Content returned by [`Adapter::read`](crate::Adapter::read)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Bytes(Bytes),
    Text(String),
}

impl Content {
    /// Raw bytes for `None`, decoded text otherwise
    pub fn decode(bytes: Bytes, encoding: Option<Encoding>) -> AdapterResult<Self> {
        match encoding {
            None => Ok(Content::Bytes(bytes)),
            Some(encoding) => encoding.decode(&bytes).map(Content::Text),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Bytes(bytes) => bytes,
            Content::Text(text) => text.as_bytes(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Bytes(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Content::Bytes(bytes) => bytes,
            Content::Text(text) => Bytes::from(text),
        }
    }
}

/// Result of [`Adapter::write`](crate::Adapter::write)
#[derive(Debug, Clone, Default)]
pub struct WriteOutcome {
    pub metadata: Metadata,
    /// An existing file was replaced
    pub overwritten: bool,
}

impl WriteOutcome {
    pub fn created(metadata: Metadata) -> Self {
        Self { metadata, overwritten: false }
    }

    pub fn replaced(metadata: Metadata) -> Self {
        Self { metadata, overwritten: true }
    }
}

/// Chunk a buffer into a stream, mostly useful for tests and in-memory adapters
pub fn chunked(bytes: Bytes, chunk_size: usize) -> ByteStream {
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<AdapterResult<Bytes>> = (0..bytes.len())
        .step_by(chunk_size)
        .map(|start| Ok(bytes.slice(start..(start + chunk_size).min(bytes.len()))))
        .collect();
    Box::pin(futures::stream::iter(chunks))
}

/// A stream that fails immediately
pub fn failed(error: AdapterError) -> ByteStream {
    Box::pin(futures::stream::once(async move { Err::<Bytes, _>(error) }))
}
