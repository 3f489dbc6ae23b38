//! # FlatDB Core
//!
//! Transactional record storage for FlatDB, one file per record.
//!
//! This crate provides:
//! - File transactions that stage changes and apply them on commit
//! - Optimistic conflict detection based on file modification times
//! - A guard that keeps a tracked record's key from changing
//! - A record store mapping create/read/update/delete onto staged files
//!
//! ## Commit protocol
//!
//! 1. The wrapped in-memory transaction commits
//! 2. Every file about to be replaced or deleted is checked against the
//!    modification time this transaction saw when it read it
//! 3. Staged files are moved over their destinations
//! 4. Files marked for deletion are removed
//! 5. Leftover staging files and empty placeholders are removed
//!
//! A conflict in step 2 aborts the transaction before anything is touched.
//! Steps 3 and 4 are not atomic across files.
//!
//! ## Example
//!
//! ```rust
//! use flatdb_core::{Config, DirectoryLayout, FileTransaction, JsonCodec, Record, RecordStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct User {
//!     id: Option<String>,
//!     email: String,
//! }
//!
//! impl Record for User {
//!     type Field = &'static str;
//!
//!     fn id(&self) -> Option<&str> {
//!         self.id.as_deref()
//!     }
//!
//!     fn set_id(&mut self, id: String) {
//!         self.id = Some(id);
//!     }
//! }
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = Config::default();
//! let store = RecordStore::new(DirectoryLayout::open(dir.path(), &config).unwrap(), JsonCodec, &config);
//!
//! let mut txn = FileTransaction::begin(&config);
//! store
//!     .create(&mut txn, User { id: Some("alice".into()), email: "alice@example.com".into() })
//!     .unwrap();
//! txn.commit().unwrap();
//!
//! assert_eq!(store.ids().unwrap(), vec!["alice".to_string()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod layout;
mod record;
mod store;
pub mod transaction;
mod types;

pub use config::Config;
pub use error::{ConflictKind, CoreError, CoreResult};
pub use layout::{validate_id, DirectoryLayout, RecordLayout};
#[cfg(feature = "cbor")]
pub use record::CborCodec;
pub use record::{JsonCodec, Record, RecordCodec, Tracked};
pub use store::RecordStore;
pub use transaction::{BaseTransaction, ConflictGuard, FileTransaction, NoopEngine, TransactionState};
pub use types::{generate_record_id, TransactionId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
