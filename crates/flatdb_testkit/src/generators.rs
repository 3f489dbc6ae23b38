//! Property-based test generators using proptest.
//!
//! Provides strategies for generating record ids, records and sequences
//! of store operations.

use crate::records::TestUser;
use proptest::prelude::*;

/// Ids used by [`store_op_strategy`], small enough to collide often.
pub const ID_POOL: [&str; 4] = ["alice", "bob", "carol", "dave"];

/// Strategy for generating ids accepted by the directory layout.
pub fn record_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9_-]{0,31}").expect("Invalid regex")
}

/// Strategy for generating ids the directory layout must reject.
pub fn invalid_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "\\.[a-z]{0,8}",
        "[a-z]{0,4}/[a-z]{0,4}",
        "[a-z]{0,4}\\\\[a-z]{0,4}",
    ]
}

/// Strategy for generating users with the given id.
pub fn user_strategy(id: String) -> impl Strategy<Value = TestUser> {
    ("[a-z]{1,12}", any::<bool>()).prop_map(move |(local, enabled)| TestUser {
        id: Some(id.clone()),
        username: id.clone(),
        email: format!("{local}@example.com"),
        enabled,
    })
}

/// One operation applied to a record store inside a transaction.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Create the user.
    Create(TestUser),
    /// Read the user and change its email.
    Update {
        /// Record id.
        id: String,
        /// New email.
        email: String,
    },
    /// Delete the user.
    Delete(String),
}

/// Strategy for generating a single store operation on [`ID_POOL`].
pub fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    let id = prop::sample::select(ID_POOL.to_vec()).prop_map(str::to_string);
    prop_oneof![
        id.clone()
            .prop_flat_map(user_strategy)
            .prop_map(StoreOp::Create),
        (id.clone(), "[a-z]{1,8}").prop_map(|(id, local)| StoreOp::Update {
            id,
            email: format!("{local}@changed.example.com"),
        }),
        id.prop_map(StoreOp::Delete),
    ]
}

/// Strategy for generating a sequence of store operations.
pub fn store_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<StoreOp>> {
    prop::collection::vec(store_op_strategy(), 0..=max_len)
}
