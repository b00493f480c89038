// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path helpers shared by adapters and front ends

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AdapterError, AdapterResult};

pub const URI_SCHEME: &str = "od://";

/// Split a drive path into normalized segments.
///
/// Empty segments and `.` are dropped, `..` pops the previous segment.
/// A `..` that would climb above the drive root is rejected.
pub fn segments(path: &str) -> AdapterResult<Vec<&str>> {
    let mut segments = Vec::new();
    for part in path.split(['/', '\\']).filter(|s| !s.is_empty()) {
        match part {
            "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(AdapterError::InvalidPath(path.to_string()));
                }
            }
            _ => segments.push(part),
        }
    }
    Ok(segments)
}

/// Normalized `a/b/c` form of a path, used as a storage key
pub fn normalize(path: &str) -> AdapterResult<String> {
    let segments = segments(path)?;
    if segments.is_empty() {
        return Err(AdapterError::InvalidPath(path.to_string()));
    }
    Ok(segments.join("/"))
}

/// Last segment of a path
pub fn name(path: &str) -> Option<&str> {
    path.rsplit(['/', '\\']).find(|s| !s.is_empty())
}

pub fn extension(path: &str) -> Option<&str> {
    name(path)
        .and_then(|n| n.rsplit_once('.'))
        .filter(|(stem, _)| !stem.is_empty())
        .map(|(_, ext)| ext)
}

/// A file address across drives: a drive id plus a path on that drive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub drive: String,
    pub path: String,
}

impl Location {
    pub fn new(drive: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            drive: drive.into(),
            path: path.into(),
        }
    }

    /// Parse `od://drive/path` or `drive:path`
    pub fn parse(input: &str) -> Option<Self> {
        if let Some(rest) = input.strip_prefix(URI_SCHEME) {
            let (drive, path) = rest.split_once('/').unwrap_or((rest, ""));
            return Self::checked(drive, path);
        }

        let (drive, path) = input.split_once(':')?;
        if path.starts_with("//") {
            return None;
        }
        Self::checked(drive, path)
    }

    fn checked(drive: &str, path: &str) -> Option<Self> {
        let valid_drive = !drive.is_empty()
            && drive
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_drive || path.is_empty() {
            return None;
        }
        Some(Self::new(drive, path))
    }

    pub fn name(&self) -> Option<&str> {
        name(&self.path)
    }

    pub fn to_uri(&self) -> String {
        format!("{}{}/{}", URI_SCHEME, self.drive, self.path.trim_start_matches('/'))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.drive, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        assert_eq!(segments("/home/user/docs").unwrap(), vec!["home", "user", "docs"]);
        assert_eq!(segments("//home//user//").unwrap(), vec!["home", "user"]);
        assert!(segments("").unwrap().is_empty());
    }

    #[test]
    fn test_segments_with_dots() {
        assert_eq!(segments("a/./b/../c").unwrap(), vec!["a", "c"]);
        assert!(matches!(segments("../etc/passwd"), Err(AdapterError::InvalidPath(_))));
        assert!(segments("a/../../b").is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a.txt").unwrap(), "a.txt");
        assert_eq!(normalize("/docs/./a.txt").unwrap(), "docs/a.txt");
        assert!(normalize("/").is_err());
        assert!(normalize("docs/..").is_err());
    }

    #[test]
    fn test_name_and_extension() {
        assert_eq!(name("/home/user/file.txt"), Some("file.txt"));
        assert_eq!(name("dir/"), Some("dir"));
        assert!(name("/").is_none());

        assert_eq!(extension("archive.tar.gz"), Some("gz"));
        assert!(extension("README").is_none());
        assert!(extension(".bashrc").is_none());
    }

    #[test]
    fn test_parse_uri() {
        let loc = Location::parse("od://s3/bucket/key.txt").unwrap();
        assert_eq!(loc.drive, "s3");
        assert_eq!(loc.path, "bucket/key.txt");
        assert_eq!(loc.to_uri(), "od://s3/bucket/key.txt");
    }

    #[test]
    fn test_parse_short_form() {
        let loc = Location::parse("scratch:notes/a.txt").unwrap();
        assert_eq!(loc, Location::new("scratch", "notes/a.txt"));
        assert_eq!(loc.name(), Some("a.txt"));
        assert_eq!(format!("{}", loc), "scratch:notes/a.txt");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Location::parse("no-drive-here").is_none());
        assert!(Location::parse(":a.txt").is_none());
        assert!(Location::parse("local:").is_none());
        assert!(Location::parse("od://local").is_none());
        assert!(Location::parse("http://example.com").is_none());
    }
}
