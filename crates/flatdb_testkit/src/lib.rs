//! # FlatDB Testkit
//!
//! Test utilities for FlatDB.
//!
//! This crate provides:
//! - Sample record types
//! - Temporary data directory fixtures
//! - Property-based test generators using proptest
//! - Helpers for running transactions on several threads
//!
//! ## Usage
//!
//! ```rust
//! use flatdb_testkit::prelude::*;
//!
//! let fixture = TestStore::new();
//! fixture.seed([TestUser::new("alice")]);
//!
//! let mut txn = fixture.begin();
//! let alice = fixture.store.read(&mut txn, "alice").unwrap().unwrap();
//! assert_eq!(alice.username, "alice");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod records;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::records::*;
    pub use crate::stress::*;
    pub use flatdb_core::{
        BaseTransaction, Config, CoreError, FileTransaction, JsonCodec, Record, RecordStore,
        TransactionState, Tracked,
    };
}

pub use fixtures::*;
pub use generators::*;
pub use records::*;
pub use stress::*;
