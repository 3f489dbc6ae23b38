//! Integration tests for the key immutability guard.

use flatdb_core::CoreError;
use flatdb_testkit::{RealmField, TestRealm, TestStore, TestUser, UserField};

#[test]
fn realm_is_stored_under_its_name() {
    let fixture = TestStore::<TestRealm>::for_records();
    fixture.seed([TestRealm::new("master")]);

    assert!(fixture.file("master").exists());
    let realm = fixture.get("master").unwrap();
    assert_eq!(realm.id.as_deref(), Some("master"));
}

#[test]
fn renaming_a_realm_is_rejected() {
    let fixture = TestStore::<TestRealm>::for_records();
    fixture.seed([TestRealm::new("master")]);

    let mut txn = fixture.begin();
    let mut realm = fixture.read(&mut txn, "master").unwrap().unwrap();
    realm
        .set(RealmField::DisplayName, |r| r.display_name = "Master".into())
        .unwrap();

    let err = realm
        .set(RealmField::Name, |r| r.name = "main".into())
        .unwrap_err();
    assert!(matches!(err, CoreError::ReadOnly { ref field } if field == "Name"));
    assert!(err.to_string().contains("Name"));
    assert!(realm.is_rejected());

    // Once rejected, the record stays read-only.
    assert!(realm
        .set(RealmField::DisplayName, |r| r.display_name = "Other".into())
        .is_err());
    assert!(matches!(
        fixture.update(&mut txn, &realm),
        Err(CoreError::ReadOnly { .. })
    ));
    txn.commit().unwrap();

    assert!(!fixture.file("main").exists());
    assert_eq!(fixture.get("master").unwrap().display_name, "MASTER");
}

#[test]
fn mutation_that_restores_the_key_is_allowed() {
    let fixture = TestStore::<TestRealm>::for_records();
    fixture.seed([TestRealm::new("master")]);

    let mut txn = fixture.begin();
    let mut realm = fixture.read(&mut txn, "master").unwrap().unwrap();
    realm
        .set(RealmField::Name, |r| r.name = "master".into())
        .unwrap();
    assert!(realm.is_updated());
    fixture.update(&mut txn, &realm).unwrap();
    txn.commit().unwrap();
}

#[test]
fn changing_the_id_of_a_user_is_rejected() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice")]);

    let mut txn = fixture.begin();
    let mut alice = fixture.read(&mut txn, "alice").unwrap().unwrap();
    alice
        .set(UserField::Username, |u| u.username = "alice2".into())
        .unwrap();
    let err = alice
        .set(UserField::Id, |u| u.id = Some("alice2".into()))
        .unwrap_err();
    assert!(matches!(err, CoreError::ReadOnly { .. }));

    txn.rollback().unwrap();
    assert!(fixture.exists("alice").unwrap());
    assert!(!fixture.exists("alice2").unwrap());
}

#[test]
fn anonymous_user_gets_a_generated_id() {
    let fixture = TestStore::new();
    let mut txn = fixture.begin();
    let created = fixture.create(&mut txn, TestUser::anonymous("nobody")).unwrap();
    txn.commit().unwrap();

    let id = created.key().unwrap();
    assert_eq!(created.id.as_deref(), Some(id));
    assert_eq!(fixture.get(id).unwrap().username, "nobody");
}
