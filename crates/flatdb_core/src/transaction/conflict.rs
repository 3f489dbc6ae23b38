//! Optimistic conflict detection.
//!
//! Rules:
//! - A file's modification time is recorded whenever the transaction reads it
//! - Before the file is replaced or deleted, the current time is compared
//!   with the recorded one; strictly newer means someone else wrote it
//! - A file that disappeared was deleted by someone else
//! - A file never read by this transaction is not checked at all
//! - Times are compared at millisecond resolution; equal times are not a
//!   conflict

use crate::error::{ConflictKind, CoreError, CoreResult};
use flatdb_storage::modified_time;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-transaction record of observed modification times.
#[derive(Debug, Default)]
pub struct ConflictGuard {
    observed: HashMap<PathBuf, SystemTime>,
}

impl ConflictGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and records the current modification time of `path`.
    ///
    /// A later snapshot of the same path replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FatalState`] if the attributes cannot be read.
    pub fn snapshot(&mut self, path: &Path) -> CoreResult<SystemTime> {
        let modified = modified_time(path).map_err(|e| CoreError::fatal_state(path, e))?;
        self.observed.insert(path.to_path_buf(), modified);
        Ok(modified)
    }

    /// Returns the recorded modification time of `path`.
    #[must_use]
    pub fn observed(&self, path: &Path) -> Option<SystemTime> {
        self.observed.get(path).copied()
    }

    /// Checks that `path` has not changed since it was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conflict`] if the file was removed or rewritten,
    /// and [`CoreError::FatalState`] if it exists but cannot be inspected.
    pub fn validate(&self, path: &Path) -> CoreResult<()> {
        let Some(observed) = self.observed.get(path) else {
            tracing::debug!(
                path = %path.display(),
                "file was not previously read, skipping validation prior to writing"
            );
            return Ok(());
        };

        match modified_time(path) {
            Ok(current) if epoch_millis(current) > epoch_millis(*observed) => {
                Err(CoreError::conflict(path, ConflictKind::Modified))
            }
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Err(CoreError::conflict(path, ConflictKind::Removed)),
            Err(e) => Err(CoreError::fatal_state(path, e)),
        }
    }

    /// Returns the number of recorded paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Forgets every recorded path.
    pub fn clear(&mut self) {
        self.observed.clear();
    }
}

/// Milliseconds since the Unix epoch, zero for earlier times.
fn epoch_millis(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::tempdir;

    fn set_modified(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn snapshot_records_modification_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").unwrap();

        let mut guard = ConflictGuard::new();
        let time = guard.snapshot(&path).unwrap();

        assert_eq!(guard.observed(&path), Some(time));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn snapshot_of_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let mut guard = ConflictGuard::new();

        let err = guard.snapshot(&dir.path().join("gone.json")).unwrap_err();
        assert!(matches!(err, CoreError::FatalState { .. }));
        assert!(guard.is_empty());
    }

    #[test]
    fn unread_path_is_not_checked() {
        let dir = tempdir().unwrap();
        let guard = ConflictGuard::new();

        // Does not even need to exist.
        guard.validate(&dir.path().join("never-read.json")).unwrap();
    }

    #[test]
    fn unchanged_file_is_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").unwrap();

        let mut guard = ConflictGuard::new();
        guard.snapshot(&path).unwrap();
        guard.validate(&path).unwrap();
    }

    #[test]
    fn newer_file_conflicts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").unwrap();

        let mut guard = ConflictGuard::new();
        let seen = guard.snapshot(&path).unwrap();
        set_modified(&path, seen + Duration::from_secs(10));

        let err = guard.validate(&path).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict {
                kind: ConflictKind::Modified,
                ..
            }
        ));
    }

    #[test]
    fn older_file_does_not_conflict() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").unwrap();

        let mut guard = ConflictGuard::new();
        let seen = guard.snapshot(&path).unwrap();
        set_modified(&path, seen - Duration::from_secs(10));

        guard.validate(&path).unwrap();
    }

    #[test]
    fn removed_file_conflicts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").unwrap();

        let mut guard = ConflictGuard::new();
        guard.snapshot(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let err = guard.validate(&path).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict {
                kind: ConflictKind::Removed,
                ..
            }
        ));
    }

    #[test]
    fn resnapshot_accepts_later_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").unwrap();

        let mut guard = ConflictGuard::new();
        let seen = guard.snapshot(&path).unwrap();
        set_modified(&path, seen + Duration::from_secs(10));
        guard.snapshot(&path).unwrap();

        guard.validate(&path).unwrap();
    }

    #[test]
    fn clear_forgets_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").unwrap();

        let mut guard = ConflictGuard::new();
        guard.snapshot(&path).unwrap();
        fs::remove_file(&path).unwrap();
        guard.clear();

        guard.validate(&path).unwrap();
    }

    #[test]
    fn change_within_same_millisecond_is_not_a_conflict() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").unwrap();
        let base = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        set_modified(&path, base);

        let mut guard = ConflictGuard::new();
        guard.snapshot(&path).unwrap();
        set_modified(&path, base + Duration::from_micros(500));

        guard.validate(&path).unwrap();
    }

    #[test]
    fn change_of_one_millisecond_conflicts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, b"{}").unwrap();
        let base = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        set_modified(&path, base);

        let mut guard = ConflictGuard::new();
        guard.snapshot(&path).unwrap();
        set_modified(&path, base + Duration::from_millis(1));

        assert!(guard.validate(&path).unwrap_err().is_conflict());
    }
}
