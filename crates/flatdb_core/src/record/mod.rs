//! Records and change tracking.
//!
//! A record is one file in the data directory. Its id determines the file
//! name, so the id must not drift while a transaction holds the record;
//! [`Tracked`] enforces that.

mod codec;
mod guard;

#[cfg(feature = "cbor")]
pub use codec::CborCodec;
pub use codec::{JsonCodec, RecordCodec};
pub use guard::Tracked;

use std::fmt;

/// Trait for types stored as records.
///
/// # Example
///
/// ```rust
/// use flatdb_core::Record;
///
/// #[derive(Debug, Clone, Copy)]
/// enum RealmField {
///     Name,
///     Enabled,
/// }
///
/// #[derive(Clone)]
/// struct Realm {
///     id: Option<String>,
///     name: String,
///     enabled: bool,
/// }
///
/// impl Record for Realm {
///     type Field = RealmField;
///
///     fn id(&self) -> Option<&str> {
///         self.id.as_deref()
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.id = Some(id);
///     }
///
///     // Realms are stored under their name.
///     fn derive_key(&self) -> Option<String> {
///         Some(self.name.clone())
///     }
/// }
/// ```
pub trait Record {
    /// Identifies a mutable field in error messages.
    type Field: fmt::Debug;

    /// Returns the record id, if one has been assigned.
    fn id(&self) -> Option<&str>;

    /// Assigns the record id.
    fn set_id(&mut self, id: String);

    /// Computes the key the record would be stored under given its current
    /// field values.
    ///
    /// Defaults to the id. Override it when the storage location is derived
    /// from other fields.
    fn derive_key(&self) -> Option<String> {
        self.id().map(str::to_owned)
    }
}
