//! Error types for FlatDB core.

use flatdb_storage::StorageError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// How a file changed underneath a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The file was deleted after this transaction read it.
    Removed,
    /// The file was rewritten after this transaction read it.
    Modified,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed => f.write_str("removed"),
            Self::Modified => f.write_str("changed"),
        }
    }
}

/// Errors that can occur in FlatDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Filesystem primitive failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file read by this transaction was changed by someone else.
    ///
    /// The transaction must not commit; retrying it from the start is safe.
    #[error("file {} was {kind} by another transaction", path.display())]
    Conflict {
        /// The file that changed.
        path: PathBuf,
        /// What happened to it.
        kind: ConflictKind,
    },

    /// A file the transaction had to observe could not be read.
    #[error("could not read file attributes of {}: {source}", path.display())]
    FatalState {
        /// The file that could not be observed.
        path: PathBuf,
        /// The underlying storage error.
        source: StorageError,
    },

    /// A field mutation would have changed the record's key.
    #[error("cannot change {field} as that would change the record key")]
    ReadOnly {
        /// The field whose mutation was rejected.
        field: String,
    },

    /// A record with the same id already exists.
    #[error("record already exists: {id}")]
    Duplicate {
        /// The conflicting id.
        id: String,
    },

    /// The id cannot be mapped to a file.
    #[error("invalid record id {id:?}: {reason}")]
    InvalidKey {
        /// The rejected id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Record content could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// The data directory is missing or unusable.
    #[error("invalid data directory: {message}")]
    InvalidDirectory {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a conflict error.
    pub fn conflict(path: &Path, kind: ConflictKind) -> Self {
        Self::Conflict {
            path: path.to_path_buf(),
            kind,
        }
    }

    /// Creates a fatal state error.
    pub fn fatal_state(path: &Path, source: StorageError) -> Self {
        Self::FatalState {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates a read-only (forbidden key mutation) error.
    pub fn read_only(field: impl Into<String>) -> Self {
        Self::ReadOnly {
            field: field.into(),
        }
    }

    /// Creates a duplicate record error.
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::Duplicate { id: id.into() }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates an invalid directory error.
    pub fn invalid_directory(message: impl Into<String>) -> Self {
        Self::InvalidDirectory {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if this is an optimistic concurrency conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns true if running the whole transaction again may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}
