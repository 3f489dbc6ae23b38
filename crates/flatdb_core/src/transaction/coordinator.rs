//! File transaction coordinator.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::transaction::conflict::ConflictGuard;
use crate::transaction::engine::{BaseTransaction, NoopEngine};
use crate::types::TransactionId;
use flatdb_storage::{move_replace, silent_delete, silent_delete_if_empty, sync_dir, touch};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can stage operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction was rolled back or its commit failed.
    Aborted,
}

/// A transaction over files in one or more data directories.
///
/// Changes are staged while the transaction is active and only touch the
/// real files on [`commit`](Self::commit):
///
/// - New content is written to staging files and moved over the
///   destination, so readers never see a partially written record
/// - Deletions are deferred, so rollback has nothing to undo
/// - Every destination that this transaction read earlier is checked for
///   external changes before anything is moved or deleted
///
/// ## No multi-file atomicity
///
/// Validation covers every touched file before the first move, but the
/// moves themselves are independent renames. If one fails, the ones
/// already applied stay applied.
///
/// ## Threads
///
/// A transaction is driven by a single thread. Concurrent transactions
/// share nothing but the filesystem.
///
/// # Example
///
/// ```rust
/// use flatdb_core::{Config, FileTransaction};
///
/// let dir = tempfile::tempdir().unwrap();
/// let staged = dir.path().join("a.tmp");
/// let target = dir.path().join("a.json");
///
/// let mut txn = FileTransaction::begin(&Config::default());
/// txn.stage_create(&staged).unwrap();
/// txn.stage_rename(&staged, &target).unwrap();
/// txn.commit().unwrap();
///
/// assert!(target.exists());
/// assert!(!staged.exists());
/// ```
pub struct FileTransaction<E: BaseTransaction = NoopEngine> {
    /// Transaction ID, also used to name staging files.
    id: TransactionId,
    /// Current state.
    state: TransactionState,
    /// In-memory side of the transaction.
    engine: E,
    /// Whether to sync directories after applying changes.
    sync_on_commit: bool,
    /// Files created as empty placeholders.
    created: Vec<PathBuf>,
    /// Files to remove on commit.
    to_delete: Vec<PathBuf>,
    /// Staging file -> destination, applied on commit.
    renames: HashMap<PathBuf, PathBuf>,
    /// Modification times observed by this transaction.
    guard: ConflictGuard,
}

impl FileTransaction<NoopEngine> {
    /// Begins a transaction with no in-memory side.
    #[must_use]
    pub fn begin(config: &Config) -> Self {
        Self::with_engine(config, NoopEngine)
    }
}

impl<E: BaseTransaction> FileTransaction<E> {
    /// Begins a transaction wrapping the in-memory transaction `engine`.
    pub fn with_engine(config: &Config, engine: E) -> Self {
        let id = TransactionId::generate();
        tracing::debug!(txid = %id, "begin file transaction");
        Self {
            id,
            state: TransactionState::Active,
            engine,
            sync_on_commit: config.sync_on_commit,
            created: Vec::new(),
            to_delete: Vec::new(),
            renames: HashMap::new(),
            guard: ConflictGuard::new(),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns the wrapped in-memory transaction.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the wrapped in-memory transaction mutably.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Creates an empty file at `path` right away and remembers it.
    ///
    /// The placeholder reserves the path: concurrent creators of the same
    /// path fail. It is removed on rollback, and on commit if nothing was
    /// moved into it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file exists or cannot be created.
    pub fn stage_create(&mut self, path: &Path) -> CoreResult<()> {
        self.ensure_active()?;
        touch(path)?;
        self.created.push(path.to_path_buf());
        Ok(())
    }

    /// Marks `path` for removal on commit.
    ///
    /// Returns true if the file exists and was not already marked. Marking
    /// the same path again returns false and still deletes it only once.
    pub fn stage_delete(&mut self, path: &Path) -> CoreResult<bool> {
        self.ensure_active()?;
        if self.to_delete.iter().any(|p| p == path) {
            return Ok(false);
        }
        let existed = path.exists();
        self.to_delete.push(path.to_path_buf());
        Ok(existed)
    }

    /// Registers `from` to replace `to` on commit.
    ///
    /// A later registration for the same `from` replaces the destination.
    pub fn stage_rename(
        &mut self,
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
    ) -> CoreResult<()> {
        self.ensure_active()?;
        self.renames.insert(from.into(), to.into());
        Ok(())
    }

    /// Records the current modification time of `path` for conflict
    /// detection and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FatalState`] if the attributes cannot be read.
    pub fn snapshot_modified(&mut self, path: &Path) -> CoreResult<SystemTime> {
        self.ensure_active()?;
        self.guard.snapshot(path)
    }

    /// Checks that `path` was not changed by someone else since this
    /// transaction read it. Paths never read pass unchecked.
    pub fn validate_freshness(&self, path: &Path) -> CoreResult<()> {
        self.guard.validate(path)
    }

    /// Returns the files created as placeholders.
    pub fn created_paths(&self) -> impl Iterator<Item = &Path> {
        self.created.iter().map(PathBuf::as_path)
    }

    /// Returns the files marked for deletion.
    pub fn pending_deletes(&self) -> impl Iterator<Item = &Path> {
        self.to_delete.iter().map(PathBuf::as_path)
    }

    /// Returns the registered `(staging, destination)` pairs.
    pub fn pending_renames(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.renames
            .iter()
            .map(|(from, to)| (from.as_path(), to.as_path()))
    }

    /// Commits the transaction.
    ///
    /// 1. Commits the in-memory transaction
    /// 2. Validates every destination and every file to delete
    /// 3. Moves staged files into place
    /// 4. Deletes files marked for deletion, ignoring failures
    /// 5. Removes leftover staging files and empty placeholders, whatever
    ///    the outcome of 3 and 4
    ///
    /// If 1 or 2 fails nothing is moved or deleted: staged files are
    /// discarded and the transaction is aborted. Retry it from the start
    /// when the error [is retryable](CoreError::is_retryable).
    pub fn commit(&mut self) -> CoreResult<()> {
        self.ensure_active()?;

        if let Err(e) = self.engine.commit() {
            tracing::debug!(txid = %self.id, error = %e, "in-memory commit failed");
            self.discard_staged();
            self.state = TransactionState::Aborted;
            return Err(e);
        }

        if let Err(e) = self.validate_all() {
            tracing::debug!(txid = %self.id, error = %e, "commit aborted by conflict");
            self.discard_staged();
            self.state = TransactionState::Aborted;
            return Err(e);
        }

        let outcome = self.apply();
        self.remove_leftovers();

        match outcome {
            Ok(()) => {
                self.state = TransactionState::Committed;
                tracing::debug!(txid = %self.id, "file transaction committed");
                Ok(())
            }
            Err(e) => {
                self.state = TransactionState::Aborted;
                Err(e)
            }
        }
    }

    /// Rolls back the transaction.
    ///
    /// Removes every staging file and every placeholder, then rolls back
    /// the in-memory transaction. Files marked for deletion are untouched.
    /// Calling this on a finished transaction does nothing.
    pub fn rollback(&mut self) -> CoreResult<()> {
        if !self.is_active() {
            tracing::debug!(txid = %self.id, state = ?self.state, "rollback of finished transaction ignored");
            return Ok(());
        }

        self.discard_staged();
        self.state = TransactionState::Aborted;
        tracing::debug!(txid = %self.id, "file transaction rolled back");
        self.engine.rollback()
    }

    /// Ensures the transaction is active.
    pub(crate) fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(CoreError::invalid_operation("transaction already aborted"))
            }
        }
    }

    /// Validates every destination and every file to delete.
    fn validate_all(&self) -> CoreResult<()> {
        let touched: BTreeSet<&Path> = self
            .renames
            .values()
            .chain(self.to_delete.iter())
            .map(PathBuf::as_path)
            .collect();

        touched
            .into_iter()
            .try_for_each(|path| self.guard.validate(path))
    }

    fn apply(&self) -> CoreResult<()> {
        let mut applied = 0usize;
        for (from, to) in &self.renames {
            if let Err(e) = move_replace(from, to) {
                // TODO: keep the replaced destinations aside and restore them
                // when a later move fails.
                tracing::warn!(
                    txid = %self.id,
                    applied,
                    remaining = self.renames.len() - applied,
                    error = %e,
                    "commit failed while moving staged files into place"
                );
                return Err(e.into());
            }
            applied += 1;
        }

        for path in &self.to_delete {
            silent_delete(path);
        }

        if self.sync_on_commit {
            self.sync_touched_dirs();
        }
        Ok(())
    }

    fn sync_touched_dirs(&self) {
        let dirs: BTreeSet<&Path> = self
            .renames
            .values()
            .chain(self.to_delete.iter())
            .filter_map(|p| p.parent())
            .collect();

        for dir in dirs {
            if let Err(e) = sync_dir(dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "could not sync directory");
            }
        }
    }

    /// Removes staging files that were not moved and placeholders that
    /// were never filled, then clears all staged state.
    fn remove_leftovers(&mut self) {
        for staging in self.renames.keys() {
            silent_delete(staging);
        }
        for path in &self.created {
            silent_delete_if_empty(path);
        }
        self.clear_staged();
    }

    /// Removes every staging file and placeholder, then clears all staged
    /// state.
    fn discard_staged(&mut self) {
        for staging in self.renames.keys() {
            silent_delete(staging);
        }
        for path in &self.created {
            silent_delete(path);
        }
        self.clear_staged();
    }

    fn clear_staged(&mut self) {
        self.created.clear();
        self.to_delete.clear();
        self.renames.clear();
        self.guard.clear();
    }
}

impl<E: BaseTransaction> Drop for FileTransaction<E> {
    fn drop(&mut self) {
        if self.is_active() {
            tracing::warn!(txid = %self.id, "file transaction dropped while active, rolling back");
            if let Err(e) = self.rollback() {
                tracing::warn!(txid = %self.id, error = %e, "rollback on drop failed");
            }
        }
    }
}

impl<E: BaseTransaction> std::fmt::Debug for FileTransaction<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTransaction")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("created", &self.created.len())
            .field("to_delete", &self.to_delete.len())
            .field("renames", &self.renames.len())
            .finish_non_exhaustive()
    }
}
