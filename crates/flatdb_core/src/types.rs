//! Core type definitions for FlatDB.

use std::fmt;
use uuid::Uuid;

/// Unique identifier for a transaction.
///
/// Generated from a random UUID when the transaction begins and never
/// changed afterwards. The id also qualifies staging file names, so it
/// never contains `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generates a fresh transaction ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Generates a fresh record id for records created without one.
#[must_use]
pub fn generate_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_unique() {
        let ids: HashSet<_> = (0..1000).map(|_| TransactionId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn transaction_id_has_no_dash() {
        let id = TransactionId::generate();
        assert!(!id.as_str().contains('-'));
        assert_eq!(id.as_str().len(), 32);
    }

    #[test]
    fn transaction_id_display() {
        let id = TransactionId::generate();
        assert_eq!(format!("{id}"), format!("txn:{}", id.as_str()));
    }
}
