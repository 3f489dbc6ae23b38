//! Clean command implementation.
//!
//! Transactions remove their own staging files and placeholders when they
//! commit or roll back. A process that dies mid-transaction leaves them
//! behind; this command removes them once they are old enough that no live
//! transaction can still own them.

use flatdb_core::{Config, DirectoryLayout, RecordLayout};
use flatdb_storage::{scan_dir, silent_delete, silent_delete_if_empty, EntryKind};
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Cleanup statistics.
#[derive(Debug, Default)]
pub struct CleanStats {
    /// Staging files removed (or that would be removed).
    pub staging_removed: usize,
    /// Empty placeholders removed (or that would be removed).
    pub placeholders_removed: usize,
    /// Leftovers kept because they are younger than the minimum age.
    pub skipped_recent: usize,
    /// Bytes freed by removing staging files.
    pub bytes_freed: u64,
}

/// Runs the clean command.
pub fn run(
    path: &Path,
    extension: &str,
    min_age: Duration,
    dry_run: bool,
    now: SystemTime,
) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No data directory found at {:?}", path).into());
    }

    println!("Cleaning {:?}", path);
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let stats = clean(path, extension, min_age, dry_run, now)?;

    println!("Staging files:   {}", stats.staging_removed);
    println!("Placeholders:    {}", stats.placeholders_removed);
    println!("Bytes freed:     {}", stats.bytes_freed);
    if stats.skipped_recent > 0 {
        println!(
            "Skipped {} file(s) younger than {}s",
            stats.skipped_recent,
            min_age.as_secs()
        );
    }

    Ok(())
}

/// Removes staging files and empty placeholders older than `min_age`.
///
/// Only files named by a transaction are touched: staging files carrying a
/// transaction id, and empty files named like a record of this layout.
/// Placeholders are re-checked right before removal, so one filled by a
/// commit in the meantime is kept.
pub fn clean(
    path: &Path,
    extension: &str,
    min_age: Duration,
    dry_run: bool,
    now: SystemTime,
) -> Result<CleanStats, Box<dyn std::error::Error>> {
    let config = Config::new()
        .create_if_missing(false)
        .file_extension(extension);
    let layout = DirectoryLayout::open(path, &config)?;
    let mut stats = CleanStats::default();

    for entry in scan_dir(layout.root())? {
        let leftover = match entry.kind {
            EntryKind::Staging => true,
            EntryKind::Placeholder => layout.id_for(&entry.path).is_some(),
            EntryKind::Record | EntryKind::Hidden => false,
        };
        if !leftover {
            continue;
        }

        let age = now.duration_since(entry.modified).unwrap_or_default();
        if age < min_age {
            stats.skipped_recent += 1;
            continue;
        }

        match entry.kind {
            EntryKind::Staging => {
                if dry_run || silent_delete(&entry.path) {
                    tracing::debug!(path = %entry.path.display(), "removed staging file");
                    stats.staging_removed += 1;
                    stats.bytes_freed += entry.len;
                }
            }
            EntryKind::Placeholder => {
                if dry_run || silent_delete_if_empty(&entry.path) {
                    tracing::debug!(path = %entry.path.display(), "removed placeholder");
                    stats.placeholders_removed += 1;
                }
            }
            EntryKind::Record | EntryKind::Hidden => {}
        }
    }

    Ok(stats)
}
