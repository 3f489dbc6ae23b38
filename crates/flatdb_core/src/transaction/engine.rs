//! Seam to the in-memory transaction engine.

use crate::error::CoreResult;

/// The in-memory side of a transaction.
///
/// A [`FileTransaction`](super::FileTransaction) wraps one of these: it
/// calls [`commit`](BaseTransaction::commit) before applying any file
/// change, and [`rollback`](BaseTransaction::rollback) after discarding its
/// staged files.
pub trait BaseTransaction {
    /// Flushes the in-memory state of the transaction.
    fn commit(&mut self) -> CoreResult<()>;

    /// Discards the in-memory state of the transaction.
    fn rollback(&mut self) -> CoreResult<()>;
}

/// A base transaction with no in-memory state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEngine;

impl BaseTransaction for NoopEngine {
    fn commit(&mut self) -> CoreResult<()> {
        Ok(())
    }

    fn rollback(&mut self) -> CoreResult<()> {
        Ok(())
    }
}

impl<T: BaseTransaction + ?Sized> BaseTransaction for Box<T> {
    fn commit(&mut self) -> CoreResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> CoreResult<()> {
        (**self).rollback()
    }
}
