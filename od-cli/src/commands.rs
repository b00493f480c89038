// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use chrono::{DateTime, Utc};
use console::style;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use od_adapters::{AdapterConfig, ConfigError, DriveRegistry};
use od_core::{
    AdapterError, CopyOptions, Drive, File, FileSystemError, Location, Payload, ReadOptions,
    RemoveOptions, WriteOptions,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Drive used for plain filesystem paths
const LOCAL_DRIVE: &str = "local";

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

pub type CliResult<T> = Result<T, CliError>;

/// Parse a location argument
/// Supports:
/// - od://drive/path - explicit URI
/// - drive:path - short form
/// - /absolute/path or relative/path - a path on the `local` drive
fn parse_location(input: &str) -> CliResult<Location> {
    if let Some(location) = Location::parse(input) {
        return Ok(location);
    }
    if input.is_empty() {
        return Err(CliError::InvalidLocation(input.to_string()));
    }

    let path = PathBuf::from(input);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };

    Ok(Location::new(LOCAL_DRIVE, absolute.to_string_lossy()))
}

fn resolve<'a>(registry: &'a DriveRegistry, input: &str) -> CliResult<(&'a Drive, Location)> {
    let location = parse_location(input)?;
    let drive = registry.get_or_err(&location.drive)?;
    Ok((drive, location))
}

/// Format a timestamp for display
fn format_time(dt: Option<DateTime<Utc>>) -> String {
    dt.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_size(size: Option<u64>) -> String {
    match size {
        Some(s) => format!("{} ({})", s, bytesize::ByteSize(s)),
        None => "-".to_string(),
    }
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn transfer_summary(verb: &str, source: &Location, dest: &Location, file: &File) -> String {
    let size = file
        .info()
        .size
        .map(|s| format!(" ({})", bytesize::ByteSize(s)))
        .unwrap_or_default();
    format!("{verb} {source} -> {dest}{size}")
}

/// Display file contents
pub async fn cat(registry: &DriveRegistry, input: &str) -> CliResult<()> {
    let (drive, location) = resolve(registry, input)?;
    tracing::debug!(%location, "cat");

    let mut stream = drive.create_read_stream(&location.path, &ReadOptions::default());
    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        // stream errors are not normalized by the drive
        let bytes = chunk.map_err(|e| FileSystemError::read(location.path.clone(), e))?;
        stdout.write_all(&bytes)?;
    }
    stdout.flush()?;

    Ok(())
}

/// Store stdin at a location
pub async fn put(registry: &DriveRegistry, input: &str) -> CliResult<()> {
    let (location, file) = store(registry, input, tokio::io::stdin()).await?;
    match file.info().size {
        Some(size) => println!("Wrote {} ({})", location, bytesize::ByteSize(size)),
        None => println!("Wrote {}", location),
    }
    Ok(())
}

/// Stream `reader` into a location, replacing any existing file
async fn store<R>(registry: &DriveRegistry, input: &str, reader: R) -> CliResult<(Location, File)>
where
    R: AsyncRead + Send + 'static,
{
    let (drive, location) = resolve(registry, input)?;
    let stream = ReaderStream::new(reader).map(|chunk| chunk.map_err(AdapterError::from));
    let file = drive
        .put(&location.path, Payload::stream(stream), &WriteOptions::default())
        .await?;
    Ok((location, file))
}

/// Copy a file
pub async fn cp(registry: &DriveRegistry, source: &str, dest: &str, force: bool) -> CliResult<()> {
    let (src_drive, src) = resolve(registry, source)?;
    let (dst_drive, dst) = resolve(registry, dest)?;

    let options = CopyOptions {
        rename: Some(dst.path.clone()),
        overwrite: force,
        ..Default::default()
    };

    let bar = spinner(format!("Copying {src} -> {dst}"));
    let result = src_drive.copy(&src.path, dst_drive, &options).await;
    bar.finish_and_clear();

    let file = result?;
    println!("{}", transfer_summary("Copied", &src, &dst, &file));
    Ok(())
}

/// Move a file
pub async fn mv(registry: &DriveRegistry, source: &str, dest: &str, force: bool) -> CliResult<()> {
    let (src_drive, src) = resolve(registry, source)?;
    let (dst_drive, dst) = resolve(registry, dest)?;

    let options = CopyOptions {
        rename: Some(dst.path.clone()),
        overwrite: force,
        ..Default::default()
    };

    let bar = spinner(format!("Moving {src} -> {dst}"));
    let result = src_drive.move_to(&src.path, dst_drive, &options).await;
    bar.finish_and_clear();

    match result {
        Ok(file) => {
            println!("{}", transfer_summary("Moved", &src, &dst, &file));
            Ok(())
        }
        Err(e @ FileSystemError::RemoveFile { .. }) => {
            eprintln!(
                "{} copied to {} but {} could not be removed",
                style("warning:").yellow(),
                dst,
                src
            );
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove files
pub async fn rm(registry: &DriveRegistry, inputs: &[String], force: bool) -> CliResult<()> {
    let options = RemoveOptions { force };

    for input in inputs {
        let (drive, location) = resolve(registry, input)?;
        drive.remove(&location.path, &options).await?;
        println!("Removed {}", location);
    }

    Ok(())
}

/// Show file information
pub async fn stat(registry: &DriveRegistry, input: &str) -> CliResult<()> {
    let (drive, location) = resolve(registry, input)?;
    let file = drive.get(&location.path, &ReadOptions::default()).await?;
    let info = file.info();

    println!("  Location: {}", location);
    println!("  Size:     {}", format_size(info.size));
    println!("  Modified: {}", format_time(info.modified));
    println!("  Created:  {}", format_time(info.created));
    if let Some(mime) = &info.mime_type {
        println!("  Type:     {}", mime);
    }
    for (key, value) in &info.extra {
        println!("  {}: {}", style(key).dim(), value);
    }

    Ok(())
}

/// Check whether a file exists
pub async fn exists(registry: &DriveRegistry, input: &str) -> CliResult<()> {
    let (drive, location) = resolve(registry, input)?;
    let found = drive.exists(&location.path, &ReadOptions::default()).await?;

    if found {
        println!("{} {}", style("yes").green(), location);
    } else {
        println!("{} {}", style("no").red(), location);
    }
    Ok(())
}

#[derive(Tabled)]
struct DriveRow {
    #[tabled(rename = "Drive")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Root")]
    root: String,
}

/// List configured drives
pub fn drives(registry: &DriveRegistry) -> CliResult<()> {
    let rows: Vec<DriveRow> = registry
        .list()
        .into_iter()
        .map(|id| {
            let (kind, root) = match registry.adapter_config(id) {
                Some(AdapterConfig::Local { root }) => ("local", root.display().to_string()),
                Some(AdapterConfig::Memory) => ("memory", "-".to_string()),
                None => ("custom", "-".to_string()),
            };
            DriveRow {
                id: id.to_string(),
                kind: kind.to_string(),
                root,
            }
        })
        .collect();

    if rows.is_empty() {
        println!("(no drives configured)");
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use od_core::MemoryAdapter;

    #[test]
    fn test_parse_location_forms() {
        assert_eq!(
            parse_location("od://scratch/a.txt").unwrap(),
            Location::new("scratch", "a.txt")
        );
        assert_eq!(
            parse_location("scratch:dir/a.txt").unwrap(),
            Location::new("scratch", "dir/a.txt")
        );
        assert_eq!(
            parse_location("/etc/hosts").unwrap(),
            Location::new(LOCAL_DRIVE, "/etc/hosts")
        );
    }

    #[test]
    fn test_parse_relative_location() {
        let location = parse_location("notes.txt").unwrap();
        assert_eq!(location.drive, LOCAL_DRIVE);
        assert!(PathBuf::from(&location.path).is_absolute());
        assert!(location.path.ends_with("notes.txt"));
    }

    #[test]
    fn test_unknown_drive() {
        let registry = DriveRegistry::new();
        let err = resolve(&registry, "nowhere:a.txt").unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::DriveNotFound(_))));
    }

    #[tokio::test]
    async fn test_store_streams_reader_into_drive() {
        let memory = MemoryAdapter::with_files([("notes.txt", "old")]).unwrap();
        let mut registry = DriveRegistry::new();
        registry.register(Drive::new("scratch", memory.clone()));

        let input: &'static [u8] = b"fresh contents";
        let (location, file) = store(&registry, "scratch:notes.txt", input).await.unwrap();

        assert_eq!(location, Location::new("scratch", "notes.txt"));
        assert_eq!(file.info().size, Some(input.len() as u64));
        assert_eq!(memory.get("notes.txt"), Some(Bytes::from_static(input)));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(None), "-");
        assert!(format_size(Some(2048)).starts_with("2048 ("));
    }
}
