//! Test fixtures and data directory helpers.
//!
//! Provides a record store over a temporary directory, an in-memory engine
//! that records what the transaction asked of it, and helpers to forge
//! modification times so conflict tests do not depend on clock resolution.

use crate::records::TestUser;
use flatdb_core::{
    BaseTransaction, Config, CoreError, CoreResult, DirectoryLayout, FileTransaction, JsonCodec,
    Record, RecordLayout, RecordStore,
};
use flatdb_storage::{scan_dir, EntryKind, FileEntry};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// A JSON record store in a temporary directory, removed on drop.
pub struct TestStore<R = TestUser> {
    /// The store.
    pub store: RecordStore<R, JsonCodec>,
    config: Config,
    temp_dir: TempDir,
}

impl TestStore<TestUser> {
    /// Creates a store of [`TestUser`] records.
    pub fn new() -> Self {
        Self::for_records()
    }
}

impl Default for TestStore<TestUser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> TestStore<R>
where
    R: Record + Serialize + DeserializeOwned,
{
    /// Creates a store of `R` records without directory syncing.
    pub fn for_records() -> Self {
        Self::with_config(Config::new().sync_on_commit(false))
    }

    /// Creates a store with the given configuration.
    pub fn with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("data");
        let layout = DirectoryLayout::open(&root, &config).expect("Failed to open layout");
        Self {
            store: RecordStore::new(layout, JsonCodec, &config),
            config,
            temp_dir,
        }
    }

    /// Returns the data directory.
    pub fn path(&self) -> &Path {
        self.store.layout().root()
    }

    /// Returns a scratch directory next to the data directory.
    pub fn scratch(&self) -> PathBuf {
        let dir = self.temp_dir.path().join("scratch");
        fs::create_dir_all(&dir).expect("Failed to create scratch directory");
        dir
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Begins a transaction with this store's configuration.
    pub fn begin(&self) -> FileTransaction {
        FileTransaction::begin(&self.config)
    }

    /// Returns the file of the record stored under `key`.
    pub fn file(&self, key: &str) -> PathBuf {
        self.store.layout().path_for(key).expect("Invalid key")
    }

    /// Creates and commits `records`, one transaction each.
    pub fn seed(&self, records: impl IntoIterator<Item = R>) {
        for record in records {
            let mut txn = self.begin();
            self.store.create(&mut txn, record).expect("Failed to create record");
            txn.commit().expect("Failed to commit seed record");
        }
    }

    /// Reads the record stored under `key` in a throwaway transaction.
    pub fn get(&self, key: &str) -> Option<R> {
        let mut txn = self.begin();
        let record = self.store.read(&mut txn, key).expect("Failed to read record");
        txn.rollback().expect("Failed to roll back read");
        record.map(|tracked| tracked.into_inner())
    }

    /// Returns staging files and empty placeholders in the data directory.
    pub fn leftovers(&self) -> Vec<FileEntry> {
        scan_dir(self.path())
            .expect("Failed to scan data directory")
            .into_iter()
            .filter(|entry| matches!(entry.kind, EntryKind::Staging | EntryKind::Placeholder))
            .collect()
    }

    /// Returns the name and content of every file in the data directory.
    pub fn contents(&self) -> BTreeMap<String, Vec<u8>> {
        scan_dir(self.path())
            .expect("Failed to scan data directory")
            .into_iter()
            .map(|entry| {
                let content = fs::read(&entry.path).expect("Failed to read file");
                (entry.name(), content)
            })
            .collect()
    }
}

impl<R> std::ops::Deref for TestStore<R> {
    type Target = RecordStore<R, JsonCodec>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Sets the modification time of `path`.
pub fn set_modified(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file")
        .set_modified(time)
        .expect("Failed to set modification time");
}

/// Moves the modification time of `path` forward by `by`.
pub fn bump_modified(path: &Path, by: Duration) {
    let current = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .expect("Failed to read modification time");
    set_modified(path, current + by);
}

/// Overwrites `path` the way a concurrent writer would, with a
/// modification time clearly after any earlier observation.
pub fn external_write(path: &Path, content: &[u8]) {
    fs::write(path, content).expect("Failed to write file");
    bump_modified(path, Duration::from_secs(5));
}

/// A call made by a transaction to its in-memory engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    /// `commit` was called.
    Commit,
    /// `rollback` was called.
    Rollback,
}

/// An in-memory engine that records the calls it receives.
///
/// Clones share the call log, so a test can keep one clone while the
/// transaction owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    fail_commit: bool,
}

impl RecordingEngine {
    /// Creates an engine whose commit always fails.
    pub fn failing() -> Self {
        Self {
            fail_commit: true,
            ..Self::default()
        }
    }

    /// Returns the calls received so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }
}

impl BaseTransaction for RecordingEngine {
    fn commit(&mut self) -> CoreResult<()> {
        self.calls.lock().push(EngineCall::Commit);
        if self.fail_commit {
            return Err(CoreError::invalid_operation("engine commit failed"));
        }
        Ok(())
    }

    fn rollback(&mut self) -> CoreResult<()> {
        self.calls.lock().push(EngineCall::Rollback);
        Ok(())
    }
}
