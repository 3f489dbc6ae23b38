//! Key immutability guard.

use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use std::ops::Deref;

/// A record under change tracking whose key cannot change.
///
/// The derived key is captured when tracking starts. Every mutation goes
/// through [`Tracked::set`], which re-derives the key afterwards and
/// rejects the mutation if the key moved. A rejected record stays rejected:
/// later mutations fail and the record store refuses to stage it, so the
/// file stored under the old key is never orphaned.
///
/// Reads go through `Deref`. There is no `DerefMut`.
#[derive(Debug, Clone)]
pub struct Tracked<R: Record> {
    record: R,
    key: Option<String>,
    updated: bool,
    rejected: Option<String>,
}

impl<R: Record> Tracked<R> {
    /// Starts tracking `record`, capturing its current key.
    pub fn new(record: R) -> Self {
        let key = record.derive_key();
        Self {
            record,
            key,
            updated: false,
            rejected: None,
        }
    }

    /// Returns the key captured when tracking started.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns the tracked record.
    #[must_use]
    pub fn get(&self) -> &R {
        &self.record
    }

    /// Applies `mutate` to the record as a change of `field`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ReadOnly`] if the mutation changed the derived
    /// key, or if an earlier mutation was already rejected. The rejected
    /// mutation is not undone.
    pub fn set<F>(&mut self, field: R::Field, mutate: F) -> CoreResult<()>
    where
        F: FnOnce(&mut R),
    {
        self.ensure_writable()?;

        let field = format!("{field:?}");
        mutate(&mut self.record);
        self.updated = true;

        if self.record.derive_key() != self.key {
            tracing::debug!(
                field = %field,
                key = ?self.key,
                "rejected mutation that changes the record key"
            );
            let err = CoreError::read_only(field.clone());
            self.rejected = Some(field);
            return Err(err);
        }
        Ok(())
    }

    /// Returns true if any mutation was applied.
    #[must_use]
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Returns true if a mutation was rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.rejected.is_some()
    }

    /// Fails if a mutation was rejected.
    pub fn ensure_writable(&self) -> CoreResult<()> {
        match &self.rejected {
            Some(field) => Err(CoreError::read_only(field.clone())),
            None => Ok(()),
        }
    }

    /// Stops tracking and returns the record.
    pub fn into_inner(self) -> R {
        self.record
    }
}

impl<R: Record> Deref for Tracked<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}
