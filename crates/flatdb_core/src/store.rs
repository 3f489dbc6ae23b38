//! Record storage on top of file transactions.
//!
//! Every record lives in its own file, addressed by its key: the record's
//! derived key, which defaults to its id. Writes never touch the record
//! file directly; new content goes to a staging file named after the
//! transaction and replaces the record file on commit.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::layout::{DirectoryLayout, RecordLayout};
use crate::record::{Record, RecordCodec, Tracked};
use crate::transaction::{BaseTransaction, FileTransaction};
use crate::types::generate_record_id;
use flatdb_storage::{
    is_empty_file, read_file, scan_dir, silent_delete, staging_path, write_file, EntryKind,
};
use std::marker::PhantomData;
use std::path::Path;

/// Stores records of type `R` as files, one file per record.
///
/// The store holds no state of its own besides its layout and codec, so it
/// can be shared between threads, each driving its own transaction.
///
/// # Example
///
/// ```rust
/// use flatdb_core::{Config, DirectoryLayout, FileTransaction, JsonCodec, Record, RecordStore};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Note {
///     id: Option<String>,
///     text: String,
/// }
///
/// impl Record for Note {
///     type Field = &'static str;
///
///     fn id(&self) -> Option<&str> {
///         self.id.as_deref()
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.id = Some(id);
///     }
/// }
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = Config::default();
/// let layout = DirectoryLayout::open(dir.path(), &config).unwrap();
/// let store = RecordStore::new(layout, JsonCodec, &config);
///
/// let mut txn = FileTransaction::begin(&config);
/// let note = Note { id: Some("n1".into()), text: "hello".into() };
/// store.create(&mut txn, note).unwrap();
/// txn.commit().unwrap();
///
/// let mut txn = FileTransaction::begin(&config);
/// let mut note = store.read(&mut txn, "n1").unwrap().unwrap();
/// note.set("text", |n| n.text = "bye".into()).unwrap();
/// store.update(&mut txn, &note).unwrap();
/// txn.commit().unwrap();
/// ```
#[derive(Debug)]
pub struct RecordStore<R, C, L = DirectoryLayout> {
    layout: L,
    codec: C,
    sync_writes: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R, C, L> RecordStore<R, C, L>
where
    R: Record,
    C: RecordCodec<R>,
    L: RecordLayout,
{
    /// Creates a store over `layout`, encoding records with `codec`.
    pub fn new(layout: L, codec: C, config: &Config) -> Self {
        Self {
            layout,
            codec,
            sync_writes: config.sync_on_commit,
            _record: PhantomData,
        }
    }

    /// Returns the layout.
    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Starts tracking a record obtained outside this store.
    pub fn track(&self, record: R) -> Tracked<R> {
        Tracked::new(record)
    }

    /// Stages the creation of `record`.
    ///
    /// A record without an id gets its derived key as id, or a fresh UUID
    /// if it has no key either. The record file is reserved right away as
    /// an empty placeholder, so a concurrent create of the same key fails
    /// even before this transaction commits.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Duplicate`] if a record (or a reservation) with
    /// the same key exists.
    pub fn create<E: BaseTransaction>(
        &self,
        tx: &mut FileTransaction<E>,
        mut record: R,
    ) -> CoreResult<Tracked<R>> {
        tx.ensure_active()?;

        if record.id().is_none() {
            let id = record.derive_key().unwrap_or_else(generate_record_id);
            record.set_id(id);
        }
        let key = storage_key(&record)?;
        let path = self.layout.path_for(&key)?;

        match tx.stage_create(&path) {
            Err(CoreError::Storage(e)) if e.is_already_exists() => {
                return Err(CoreError::duplicate(key));
            }
            other => other?,
        }
        self.write_staged(tx, &path, &record)?;

        tracing::trace!(txid = %tx.id(), key = %key, "staged record create");
        Ok(Tracked::new(record))
    }

    /// Reads the record stored under `key`.
    ///
    /// Returns `None` if there is no such record, including when the file is
    /// an empty reservation of an uncommitted create. The file's
    /// modification time is recorded first, so a later change by someone
    /// else is detected when this transaction writes the record back.
    pub fn read<E: BaseTransaction>(
        &self,
        tx: &mut FileTransaction<E>,
        key: &str,
    ) -> CoreResult<Option<Tracked<R>>> {
        let path = self.layout.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        match tx.snapshot_modified(&path) {
            Err(CoreError::FatalState { source, .. }) if source.is_not_found() => {
                return Ok(None);
            }
            other => other?,
        };

        let bytes = match read_file(&path)? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Ok(None),
        };

        let mut record = self.codec.decode(&bytes)?;
        if record.id().is_none() {
            record.set_id(key.to_string());
        }
        Ok(Some(Tracked::new(record)))
    }

    /// Stages new content for a tracked record.
    ///
    /// Fails right away if the record file changed since this transaction
    /// read it, instead of waiting for commit.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ReadOnly`] if a mutation of the record was rejected
    /// - [`CoreError::Conflict`] if the file changed since it was read
    pub fn update<E: BaseTransaction>(
        &self,
        tx: &mut FileTransaction<E>,
        record: &Tracked<R>,
    ) -> CoreResult<()> {
        record.ensure_writable()?;
        let key = record
            .key()
            .ok_or_else(|| CoreError::invalid_operation("cannot update a record without a key"))?;
        let path = self.layout.path_for(key)?;

        tx.validate_freshness(&path)?;
        self.write_staged(tx, &path, record.get())?;

        tracing::trace!(txid = %tx.id(), key = %key, "staged record update");
        Ok(())
    }

    /// Stages the removal of the record stored under `key`.
    ///
    /// Returns true if the record file exists and was not already marked.
    pub fn delete<E: BaseTransaction>(
        &self,
        tx: &mut FileTransaction<E>,
        key: &str,
    ) -> CoreResult<bool> {
        let path = self.layout.path_for(key)?;
        tx.stage_delete(&path)
    }

    /// Checks if a committed record is stored under `key`.
    pub fn exists(&self, key: &str) -> CoreResult<bool> {
        let path = self.layout.path_for(key)?;
        match is_empty_file(&path) {
            Ok(empty) => Ok(!empty),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the keys of all committed records, sorted.
    ///
    /// Staging files and empty reservations are skipped.
    pub fn ids(&self) -> CoreResult<Vec<String>> {
        let entries = scan_dir(self.layout.root())?;
        Ok(entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Record)
            .filter_map(|entry| self.layout.id_for(&entry.path))
            .collect())
    }

    /// Writes `record` to this transaction's staging file for `path` and
    /// registers the move onto `path`.
    fn write_staged<E: BaseTransaction>(
        &self,
        tx: &mut FileTransaction<E>,
        path: &Path,
        record: &R,
    ) -> CoreResult<()> {
        tx.ensure_active()?;

        let bytes = self.codec.encode(record)?;
        let staging = staging_path(path, tx.id().as_str());
        if let Err(e) = write_file(&staging, &bytes, self.sync_writes) {
            silent_delete(&staging);
            return Err(e.into());
        }
        tx.stage_rename(staging, path)
    }
}

fn storage_key<R: Record>(record: &R) -> CoreResult<String> {
    record
        .derive_key()
        .or_else(|| record.id().map(str::to_owned))
        .ok_or_else(|| CoreError::invalid_operation("record has neither a key nor an id"))
}
