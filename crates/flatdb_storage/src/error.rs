//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file that must be created fresh already exists.
    #[error("file already exists: {}", path.display())]
    AlreadyExists {
        /// The path that was expected to be absent.
        path: PathBuf,
    },

    /// A new file could not be created.
    #[error("cannot create {}: {source}", path.display())]
    Create {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A staged file could not be moved into place.
    #[error("cannot move {} to {}: {source}", from.display(), to.display())]
    Move {
        /// The staging path.
        from: PathBuf,
        /// The destination path.
        to: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// File attributes could not be read.
    #[error("cannot read file attributes of {}: {source}", path.display())]
    Attributes {
        /// The path whose attributes were requested.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}

impl StorageError {
    /// Returns true if the error reports a file that already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::AlreadyExists { .. } => true,
            Self::Io(e) => e.kind() == io::ErrorKind::AlreadyExists,
            _ => false,
        }
    }

    /// Returns true if the error reports a missing file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == io::ErrorKind::NotFound,
            Self::Create { source, .. }
            | Self::Move { source, .. }
            | Self::Attributes { source, .. } => source.kind() == io::ErrorKind::NotFound,
            Self::AlreadyExists { .. } => false,
        }
    }
}
