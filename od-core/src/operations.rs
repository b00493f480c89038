// SPDX-License-Identifier: AGPL-3.0-or-later
//! Operation options

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AdapterError, AdapterResult};

/// Text encoding applied when reading or writing text content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[serde(alias = "utf-8")]
    Utf8,
    Latin1,
    Hex,
}

impl Encoding {
    /// Turn stored bytes into text
    pub fn decode(&self, bytes: &[u8]) -> AdapterResult<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| AdapterError::Encoding(e.to_string())),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Hex => Ok(hex::encode(bytes)),
        }
    }

    /// Turn text into the bytes to store
    pub fn encode(&self, text: &str) -> AdapterResult<Bytes> {
        match self {
            Encoding::Utf8 => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Encoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        AdapterError::Encoding(format!("'{c}' is not representable in latin1"))
                    })
                })
                .collect::<AdapterResult<Vec<u8>>>()
                .map(Bytes::from),
            Encoding::Hex => hex::decode(text)
                .map(Bytes::from)
                .map_err(|e| AdapterError::Encoding(e.to_string())),
        }
    }
}

impl FromStr for Encoding {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "binary" => Ok(Encoding::Latin1),
            "hex" => Ok(Encoding::Hex),
            other => Err(AdapterError::Encoding(format!("unknown encoding: {other}"))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Utf8 => "utf8",
            Encoding::Latin1 => "latin1",
            Encoding::Hex => "hex",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Return text decoded with this encoding instead of raw bytes
    pub encoding: Option<Encoding>,
}

impl ReadOptions {
    pub fn with_encoding(encoding: Encoding) -> Self {
        Self { encoding: Some(encoding) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Encoding of text payloads, UTF-8 when unset
    pub encoding: Option<Encoding>,
    /// Replace an existing file instead of failing
    pub overwrite: bool,
}

impl WriteOptions {
    pub fn overwrite() -> Self {
        Self { overwrite: true, ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOptions {
    /// Succeed when the target is already gone
    pub force: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOptions {
    /// Destination path, defaults to the source path
    pub rename: Option<String>,
    pub encoding: Option<Encoding>,
    pub overwrite: bool,
}

pub type MoveOptions = CopyOptions;

impl CopyOptions {
    pub fn rename(path: impl Into<String>) -> Self {
        Self { rename: Some(path.into()), ..Default::default() }
    }

    /// Options forwarded to the source read, without `rename`
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions { encoding: self.encoding }
    }

    /// Options forwarded to the destination write, without `rename`
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            encoding: self.encoding,
            overwrite: self.overwrite,
        }
    }
}
