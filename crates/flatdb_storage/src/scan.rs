//! Directory scanning.

use crate::error::StorageResult;
use crate::staging::{is_staging_name, is_transaction_staging_name};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Classification of a file found in a data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A committed record file.
    Record,
    /// A staging file written by a transaction and not moved into place.
    Staging,
    /// An empty visible file. It is a reservation of an uncommitted create
    /// (or a leftover of a crashed one) only if its name maps to a record.
    Placeholder,
    /// Any other hidden file, such as `.gitkeep`.
    Hidden,
}

/// A regular file found by [`scan_dir`].
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Full path of the file.
    pub path: PathBuf,
    /// What the file is.
    pub kind: EntryKind,
    /// Size in bytes.
    pub len: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

impl FileEntry {
    /// Returns the file name as a string.
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Lists the regular files of `dir`, sorted by path.
///
/// Files that disappear while the directory is being read are skipped;
/// concurrent transactions remove staging files at any time.
pub fn scan_dir(dir: &Path) -> StorageResult<Vec<FileEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        if !meta.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let kind = if is_transaction_staging_name(&file_name.to_string_lossy()) {
            EntryKind::Staging
        } else if is_staging_name(&file_name) {
            EntryKind::Hidden
        } else if meta.len() == 0 {
            EntryKind::Placeholder
        } else {
            EntryKind::Record
        };

        entries.push(FileEntry {
            path: entry.path(),
            kind,
            len: meta.len(),
            modified: meta.modified()?,
        });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}
