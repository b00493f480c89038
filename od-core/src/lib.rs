// SPDX-License-Identifier: AGPL-3.0-or-later
//! omnidrive core
//!
//! A uniform file API over pluggable storage adapters. A [`Drive`] wraps one
//! [`Adapter`], normalizes its failures into [`FileSystemError`], and moves
//! files between drives by streaming through the `Drive` API. A [`File`] is a
//! handle bound to a drive and path.

pub mod adapter;
pub mod content;
pub mod drive;
pub mod error;
pub mod file;
pub mod memory;
pub mod metadata;
pub mod operations;
pub mod path;

pub use adapter::Adapter;
pub use content::{ByteStream, Content, Payload, WriteOutcome};
pub use drive::Drive;
pub use error::{AdapterError, AdapterResult, FileSystemError, FsResult, OperationKind};
pub use file::File;
pub use memory::MemoryAdapter;
pub use metadata::Metadata;
pub use operations::{CopyOptions, Encoding, MoveOptions, ReadOptions, RemoveOptions, WriteOptions};
pub use path::Location;
