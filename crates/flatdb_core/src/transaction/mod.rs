//! File transactions.
//!
//! A [`FileTransaction`] stages file changes next to their destinations and
//! applies them on commit, after checking with its [`ConflictGuard`] that
//! nothing it read was changed by someone else in the meantime. It wraps a
//! [`BaseTransaction`] holding the in-memory side of the same unit of work.

mod conflict;
mod coordinator;
mod engine;

pub use conflict::ConflictGuard;
pub use coordinator::{FileTransaction, TransactionState};
pub use engine::{BaseTransaction, NoopEngine};
