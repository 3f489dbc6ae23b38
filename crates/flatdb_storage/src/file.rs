//! File-level primitives used by the commit protocol.
//!
//! Every record lives in its own file. Writers never modify a record file
//! in place: they write a staging file and move it over the destination.
//! Cleanup helpers (`silent_delete*`) swallow errors because they run on
//! paths that may already be gone.

use crate::error::{StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

/// Creates a new, empty file at `path`.
///
/// Fails if the file already exists, so two writers can never both believe
/// they created the same file.
///
/// # Errors
///
/// Returns [`StorageError::AlreadyExists`] if the file exists and
/// [`StorageError::Create`] for any other I/O failure.
pub fn touch(path: &Path) -> StorageResult<()> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(StorageError::AlreadyExists {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(StorageError::Create {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `data` to `path`, replacing any previous content.
///
/// With `sync` set, the file is flushed to durable storage before returning.
pub fn write_file(path: &Path, data: &[u8], sync: bool) -> StorageResult<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}

/// Reads the full content of `path`.
///
/// Returns `None` if the file does not exist.
pub fn read_file(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Atomically moves `from` over `to`, replacing `to` if it exists.
///
/// Readers of `to` observe either the previous content or the new content,
/// never a partially written file. Both paths must be on the same
/// filesystem; staging files are always siblings of their target.
///
/// # Errors
///
/// Returns [`StorageError::Move`] if the rename fails.
pub fn move_replace(from: &Path, to: &Path) -> StorageResult<()> {
    fs::rename(from, to).map_err(|source| StorageError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// Returns the last modification time of `path`.
///
/// # Errors
///
/// Returns [`StorageError::Attributes`] if the metadata cannot be read,
/// including when the file does not exist.
pub fn modified_time(path: &Path) -> StorageResult<SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| StorageError::Attributes {
            path: path.to_path_buf(),
            source,
        })
}

/// Returns true if `path` is a regular file with no content.
pub fn is_empty_file(path: &Path) -> StorageResult<bool> {
    let meta = fs::metadata(path)?;
    Ok(meta.is_file() && meta.len() == 0)
}

/// Removes `path` if it exists, ignoring every error.
///
/// Returns true if a file was removed.
pub fn silent_delete(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "ignoring failed delete");
            false
        }
    }
}

/// Removes `path` only if it exists and is empty, ignoring every error.
///
/// Used to drop placeholder files that were created but never filled in.
/// Returns true if a file was removed.
pub fn silent_delete_if_empty(path: &Path) -> bool {
    match is_empty_file(path) {
        Ok(true) => silent_delete(path),
        Ok(false) => false,
        Err(e) => {
            if e.is_not_found() {
                return false;
            }
            tracing::trace!(path = %path.display(), error = %e, "ignoring unreadable placeholder");
            false
        }
    }
}

/// Syncs a directory so that renames, creations and deletions of its
/// entries are durable.
#[cfg(unix)]
pub fn sync_dir(path: &Path) -> StorageResult<()> {
    let dir = File::open(path)?;
    dir.sync_all()?;
    Ok(())
}

/// Syncs a directory so that renames, creations and deletions of its
/// entries are durable.
///
/// NTFS journals metadata updates, and directories cannot be opened for
/// syncing, so this is a no-op off Unix.
#[cfg(not(unix))]
pub fn sync_dir(_path: &Path) -> StorageResult<()> {
    Ok(())
}
