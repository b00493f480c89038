// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for omnidrive
//!
//! Adapters fail with [`AdapterError`]. The [`Drive`](crate::Drive) boundary
//! normalizes every adapter failure into exactly one [`FileSystemError`]
//! variant, keeping the adapter error as its source.

use thiserror::Error;

/// Result type returned by adapters
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Result type returned by drives and files
pub type FsResult<T> = Result<T, FileSystemError>;

/// Failure reported by a storage adapter
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AdapterError {
    /// Wrap any error type as an adapter failure.
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AdapterError::Other(Box::new(error))
    }

    /// Map an I/O error for `path` onto the closest adapter variant.
    pub fn from_io(path: &str, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => AdapterError::NotFound(path.to_string()),
            ErrorKind::AlreadyExists => AdapterError::AlreadyExists(path.to_string()),
            ErrorKind::PermissionDenied => AdapterError::PermissionDenied(path.to_string()),
            _ => AdapterError::Io(error),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            AdapterError::NotFound(_) => true,
            AdapterError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// The operation a [`FileSystemError`] was raised for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Write,
    Remove,
}

/// Normalized drive error
///
/// `copy` and `move_to` have no variant of their own: they fail with
/// whichever of read, write or remove actually failed.
#[derive(Error, Debug)]
pub enum FileSystemError {
    #[error("Error occurred while trying to read the file \"{path}\"")]
    ReadFile {
        path: String,
        #[source]
        source: AdapterError,
    },

    #[error("Error occurred while trying to write the file \"{path}\"")]
    WriteFile {
        path: String,
        #[source]
        source: AdapterError,
    },

    #[error("Error occurred while trying to remove the file \"{path}\"")]
    RemoveFile {
        path: String,
        #[source]
        source: AdapterError,
    },
}

impl FileSystemError {
    pub fn read(path: impl Into<String>, source: AdapterError) -> Self {
        FileSystemError::ReadFile { path: path.into(), source }
    }

    pub fn write(path: impl Into<String>, source: AdapterError) -> Self {
        FileSystemError::WriteFile { path: path.into(), source }
    }

    pub fn remove(path: impl Into<String>, source: AdapterError) -> Self {
        FileSystemError::RemoveFile { path: path.into(), source }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            FileSystemError::ReadFile { .. } => OperationKind::Read,
            FileSystemError::WriteFile { .. } => OperationKind::Write,
            FileSystemError::RemoveFile { .. } => OperationKind::Remove,
        }
    }

    /// Path the failed operation targeted
    pub fn path(&self) -> &str {
        match self {
            FileSystemError::ReadFile { path, .. }
            | FileSystemError::WriteFile { path, .. }
            | FileSystemError::RemoveFile { path, .. } => path,
        }
    }

    /// Underlying adapter failure
    pub fn cause(&self) -> &AdapterError {
        match self {
            FileSystemError::ReadFile { source, .. }
            | FileSystemError::WriteFile { source, .. }
            | FileSystemError::RemoveFile { source, .. } => source,
        }
    }

    pub fn into_cause(self) -> AdapterError {
        match self {
            FileSystemError::ReadFile { source, .. }
            | FileSystemError::WriteFile { source, .. }
            | FileSystemError::RemoveFile { source, .. } => source,
        }
    }
}
