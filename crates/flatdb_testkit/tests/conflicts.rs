//! Integration tests for optimistic conflict detection.

use flatdb_core::{ConflictKind, CoreError, TransactionState};
use flatdb_testkit::{bump_modified, external_write, TestStore, TestUser, UserField};
use std::fs;
use std::time::Duration;

#[test]
fn external_change_aborts_update() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice")]);

    let mut txn = fixture.begin();
    let mut alice = fixture.read(&mut txn, "alice").unwrap().unwrap();
    alice
        .set(UserField::Email, |u| u.email = "mine@example.com".into())
        .unwrap();
    fixture.update(&mut txn, &alice).unwrap();

    external_write(&fixture.file("alice"), b"{\"external\":true}");

    let err = txn.commit().unwrap_err();
    assert!(matches!(
        err,
        CoreError::Conflict {
            kind: ConflictKind::Modified,
            ..
        }
    ));
    assert!(err.is_retryable());
    assert_eq!(
        fs::read(fixture.file("alice")).unwrap(),
        b"{\"external\":true}"
    );
    assert!(fixture.leftovers().is_empty());
}

#[test]
fn external_delete_aborts_delete() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice"), TestUser::new("bob")]);

    let mut txn = fixture.begin();
    fixture.read(&mut txn, "alice").unwrap().unwrap();
    fixture.delete(&mut txn, "alice").unwrap();
    fixture.delete(&mut txn, "bob").unwrap();

    fs::remove_file(fixture.file("alice")).unwrap();

    let err = txn.commit().unwrap_err();
    assert!(matches!(
        err,
        CoreError::Conflict {
            kind: ConflictKind::Removed,
            ..
        }
    ));
    // Nothing applied, not even the unrelated delete.
    assert!(fixture.exists("bob").unwrap());
}

#[test]
fn second_committer_loses() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice")]);

    let mut first = fixture.begin();
    let mut second = fixture.begin();
    let mut a1 = fixture.read(&mut first, "alice").unwrap().unwrap();
    let mut a2 = fixture.read(&mut second, "alice").unwrap().unwrap();

    a1.set(UserField::Email, |u| u.email = "first@example.com".into())
        .unwrap();
    fixture.update(&mut first, &a1).unwrap();
    a2.set(UserField::Email, |u| u.email = "second@example.com".into())
        .unwrap();
    fixture.update(&mut second, &a2).unwrap();

    first.commit().unwrap();
    bump_modified(&fixture.file("alice"), Duration::from_secs(5));

    assert!(second.commit().unwrap_err().is_conflict());
    assert_eq!(second.state(), TransactionState::Aborted);
    assert_eq!(fixture.get("alice").unwrap().email, "first@example.com");
    assert!(fixture.leftovers().is_empty());
}

#[test]
fn retry_after_conflict_succeeds() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice")]);

    let mut txn = fixture.begin();
    let mut alice = fixture.read(&mut txn, "alice").unwrap().unwrap();
    alice.set(UserField::Enabled, |u| u.enabled = false).unwrap();
    fixture.update(&mut txn, &alice).unwrap();
    bump_modified(&fixture.file("alice"), Duration::from_secs(5));
    assert!(txn.commit().unwrap_err().is_retryable());

    let mut retry = fixture.begin();
    let mut alice = fixture.read(&mut retry, "alice").unwrap().unwrap();
    alice.set(UserField::Enabled, |u| u.enabled = false).unwrap();
    fixture.update(&mut retry, &alice).unwrap();
    retry.commit().unwrap();

    assert!(!fixture.get("alice").unwrap().enabled);
}

#[test]
fn unread_record_is_overwritten_without_check() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice")]);

    // Tracked without reading: freshness is unknown and not checked.
    let mut txn = fixture.begin();
    let mut alice = fixture.track(TestUser::new("alice"));
    alice
        .set(UserField::Email, |u| u.email = "blind@example.com".into())
        .unwrap();
    fixture.update(&mut txn, &alice).unwrap();
    external_write(&fixture.file("alice"), b"{\"external\":true}");

    txn.commit().unwrap();
    assert_eq!(fixture.get("alice").unwrap().email, "blind@example.com");
}

#[test]
fn older_modification_time_is_not_a_conflict() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice")]);

    let mut txn = fixture.begin();
    let mut alice = fixture.read(&mut txn, "alice").unwrap().unwrap();
    alice.set(UserField::Enabled, |u| u.enabled = false).unwrap();
    fixture.update(&mut txn, &alice).unwrap();

    let file = fs::File::options()
        .write(true)
        .open(fixture.file("alice"))
        .unwrap();
    let seen = file.metadata().unwrap().modified().unwrap();
    file.set_modified(seen - Duration::from_secs(60)).unwrap();
    drop(file);

    txn.commit().unwrap();
    assert!(!fixture.get("alice").unwrap().enabled);
}
