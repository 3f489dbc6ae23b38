//! # FlatDB Storage
//!
//! Filesystem primitives for FlatDB.
//!
//! This crate provides the lowest-level building blocks used by the
//! transaction layer. It knows nothing about records or transactions;
//! it only deals with paths and bytes.
//!
//! ## Design Principles
//!
//! - One record per file; files are never modified in place
//! - New content becomes visible through an atomic rename
//! - Staging files are hidden (dot-prefixed) so they are never mistaken
//!   for records
//! - Cleanup helpers never fail; they report whether they removed anything
//!
//! ## Example
//!
//! ```rust
//! use flatdb_storage::{move_replace, staging_path, write_file};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let target = dir.path().join("alice.json");
//! let staged = staging_path(&target, "tx1");
//!
//! write_file(&staged, b"{}", false).unwrap();
//! move_replace(&staged, &target).unwrap();
//! assert!(target.exists());
//! assert!(!staged.exists());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod scan;
mod staging;

pub use error::{StorageError, StorageResult};
pub use file::{
    is_empty_file, modified_time, move_replace, read_file, silent_delete, silent_delete_if_empty,
    sync_dir, touch, write_file,
};
pub use scan::{scan_dir, EntryKind, FileEntry};
pub use staging::{
    is_staging_name, is_transaction_staging_name, is_transaction_tag, split_staging_name,
    staging_path, STAGING_PREFIX,
};
