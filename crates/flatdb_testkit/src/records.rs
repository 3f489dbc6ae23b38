//! Sample record types.

use flatdb_core::Record;
use serde::{Deserialize, Serialize};

/// Fields of [`TestUser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    /// `id`
    Id,
    /// `username`
    Username,
    /// `email`
    Email,
    /// `enabled`
    Enabled,
}

/// A user stored under its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUser {
    /// Record id.
    pub id: Option<String>,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Whether the account is enabled.
    pub enabled: bool,
}

impl TestUser {
    /// Creates an enabled user whose id and username are both `id`.
    pub fn new(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            enabled: true,
        }
    }

    /// Creates a user without an id.
    pub fn anonymous(username: &str) -> Self {
        Self {
            id: None,
            ..Self::new(username)
        }
    }
}

impl Record for TestUser {
    type Field = UserField;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

/// Fields of [`TestRealm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealmField {
    /// `name`
    Name,
    /// `display_name`
    DisplayName,
}

/// A realm stored under its name rather than its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRealm {
    /// Record id.
    pub id: Option<String>,
    /// Unique name, used as the storage key.
    pub name: String,
    /// Human readable name.
    pub display_name: String,
}

impl TestRealm {
    /// Creates a realm with a generated id.
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            display_name: name.to_uppercase(),
        }
    }
}

impl Record for TestRealm {
    type Field = RealmField;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn derive_key(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

/// A counter, for contention tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Record id.
    pub id: Option<String>,
    /// Current value.
    pub value: u64,
}

impl Counter {
    /// Creates a counter at zero.
    pub fn new(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            value: 0,
        }
    }
}

impl Record for Counter {
    type Field = &'static str;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}
