//! Inspect command implementation.

use flatdb_core::{Config, DirectoryLayout, RecordLayout};
use flatdb_storage::{scan_dir, split_staging_name, EntryKind, FileEntry};
use serde::Serialize;
use std::path::Path;
use std::time::SystemTime;

/// Data directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data directory path.
    pub path: String,
    /// Ids of committed records, sorted.
    pub records: Vec<String>,
    /// Total size of record files in bytes.
    pub record_bytes: u64,
    /// Files that are neither records of this layout nor left by a
    /// transaction.
    pub foreign_files: Vec<String>,
    /// Empty files reserved by uncommitted creates.
    pub placeholders: Vec<PendingFile>,
    /// Staging files that were not moved into place yet.
    pub staging: Vec<StagingFile>,
}

/// An empty placeholder file.
#[derive(Debug, Serialize)]
pub struct PendingFile {
    /// File name.
    pub name: String,
    /// Seconds since last modification.
    pub age_secs: u64,
}

/// A staging file.
#[derive(Debug, Serialize)]
pub struct StagingFile {
    /// File name.
    pub name: String,
    /// Id of the transaction that wrote it, if the name is well formed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    /// File the staged content is meant to replace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Size in bytes.
    pub len: u64,
    /// Seconds since last modification.
    pub age_secs: u64,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    extension: &str,
    format: &str,
    now: SystemTime,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, extension, now)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects the contents of the data directory at `path`.
pub fn inspect(
    path: &Path,
    extension: &str,
    now: SystemTime,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let config = Config::new()
        .create_if_missing(false)
        .file_extension(extension);
    let layout = DirectoryLayout::open(path, &config)?;

    let mut result = InspectResult {
        path: path.display().to_string(),
        records: Vec::new(),
        record_bytes: 0,
        foreign_files: Vec::new(),
        placeholders: Vec::new(),
        staging: Vec::new(),
    };

    for entry in scan_dir(layout.root())? {
        match entry.kind {
            EntryKind::Record => match layout.id_for(&entry.path) {
                Some(id) => {
                    result.records.push(id);
                    result.record_bytes += entry.len;
                }
                None => result.foreign_files.push(entry.name()),
            },
            EntryKind::Placeholder if layout.id_for(&entry.path).is_some() => {
                result.placeholders.push(PendingFile {
                    name: entry.name(),
                    age_secs: age_secs(&entry, now),
                });
            }
            EntryKind::Placeholder | EntryKind::Hidden => result.foreign_files.push(entry.name()),
            EntryKind::Staging => {
                let name = entry.name();
                let (transaction, target) = match split_staging_name(&name) {
                    Some((tx, target)) => (Some(tx.to_string()), Some(target.to_string())),
                    None => (None, None),
                };
                result.staging.push(StagingFile {
                    transaction,
                    target,
                    len: entry.len,
                    age_secs: age_secs(&entry, now),
                    name,
                });
            }
        }
    }

    Ok(result)
}

fn age_secs(entry: &FileEntry, now: SystemTime) -> u64 {
    now.duration_since(entry.modified)
        .map(|age| age.as_secs())
        .unwrap_or(0)
}

fn print_text_output(result: &InspectResult) {
    println!("FlatDB Data Directory: {}", result.path);
    println!("{}", "=".repeat(50));
    println!();
    println!("Records:         {}", result.records.len());
    println!("Record bytes:    {}", result.record_bytes);
    println!("Placeholders:    {}", result.placeholders.len());
    println!("Staging files:   {}", result.staging.len());

    if !result.foreign_files.is_empty() {
        println!("Other files:     {}", result.foreign_files.len());
    }

    if !result.placeholders.is_empty() {
        println!();
        println!("Placeholders:");
        for p in &result.placeholders {
            println!("  {} ({}s old)", p.name, p.age_secs);
        }
    }

    if !result.staging.is_empty() {
        println!();
        println!("Staging files:");
        for s in &result.staging {
            match (&s.transaction, &s.target) {
                (Some(tx), Some(target)) => println!(
                    "  {} -> {} (txn {}, {} bytes, {}s old)",
                    s.name, target, tx, s.len, s.age_secs
                ),
                _ => println!("  {} ({} bytes, {}s old)", s.name, s.len, s.age_secs),
            }
        }
    }
}
