//! Integration tests for the file transaction commit protocol.

use flatdb_core::{Config, CoreError, FileTransaction, TransactionState};
use flatdb_testkit::{EngineCall, RecordingEngine, TestStore, TestUser, UserField};
use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

fn config() -> Config {
    Config::new().sync_on_commit(false)
}

#[test]
fn create_rename_commit() {
    let fixture = TestStore::new();
    let tmp = fixture.scratch();
    let staged = tmp.join("A");
    let target = fixture.path().join("A");

    let mut txn = FileTransaction::begin(&config());
    txn.stage_create(&staged).unwrap();
    txn.stage_rename(&staged, &target).unwrap();
    txn.commit().unwrap();

    assert!(target.exists());
    assert!(!staged.exists());
}

#[test]
fn rollback_keeps_deleted_file() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("b")]);
    let before = fs::read(fixture.file("b")).unwrap();

    let mut txn = fixture.begin();
    assert!(fixture.delete(&mut txn, "b").unwrap());
    txn.rollback().unwrap();

    assert_eq!(fs::read(fixture.file("b")).unwrap(), before);
}

#[test]
fn unrenamed_placeholder_is_removed_on_commit() {
    let fixture = TestStore::new();
    let placeholder = fixture.scratch().join("C");

    let mut txn = fixture.begin();
    txn.stage_create(&placeholder).unwrap();
    txn.commit().unwrap();

    assert!(!placeholder.exists());
}

#[test]
fn rollback_leaves_no_files_behind() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice")]);
    let before = fixture.contents();

    let mut txn = fixture.begin();
    fixture.create(&mut txn, TestUser::new("bob")).unwrap();
    fixture.create(&mut txn, TestUser::anonymous("ghost")).unwrap();
    let mut alice = fixture.read(&mut txn, "alice").unwrap().unwrap();
    alice
        .set(UserField::Email, |u| u.email = "new@example.com".into())
        .unwrap();
    fixture.update(&mut txn, &alice).unwrap();
    fixture.delete(&mut txn, "alice").unwrap();
    assert!(!fixture.leftovers().is_empty());

    txn.rollback().unwrap();

    assert!(fixture.leftovers().is_empty());
    assert_eq!(fixture.contents(), before);
}

#[test]
fn commit_applies_every_change() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice"), TestUser::new("bob")]);

    let mut txn = fixture.begin();
    fixture.create(&mut txn, TestUser::new("carol")).unwrap();
    let mut alice = fixture.read(&mut txn, "alice").unwrap().unwrap();
    alice.set(UserField::Enabled, |u| u.enabled = false).unwrap();
    fixture.update(&mut txn, &alice).unwrap();
    fixture.delete(&mut txn, "bob").unwrap();
    txn.commit().unwrap();

    assert_eq!(
        fixture.ids().unwrap(),
        vec!["alice".to_string(), "carol".to_string()]
    );
    assert!(!fixture.get("alice").unwrap().enabled);
    assert!(fixture.leftovers().is_empty());
}

#[test]
fn readers_see_old_or_new_content() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice")]);
    let old = fs::read(fixture.file("alice")).unwrap();

    let mut txn = fixture.begin();
    let mut alice = fixture.read(&mut txn, "alice").unwrap().unwrap();
    alice
        .set(UserField::Email, |u| u.email = "new@example.com".into())
        .unwrap();
    fixture.update(&mut txn, &alice).unwrap();

    assert_eq!(fs::read(fixture.file("alice")).unwrap(), old);
    txn.commit().unwrap();
    assert_eq!(fixture.get("alice").unwrap().email, "new@example.com");
}

#[test]
fn concurrent_reader_never_sees_partial_record() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("alice")]);
    let path = fixture.file("alice");
    let allowed: Vec<String> = std::iter::once("alice@example.com".to_string())
        .chain((0..20).map(|i| format!("v{i}@example.com")))
        .collect();
    let done = AtomicBool::new(false);
    let reads = AtomicUsize::new(0);

    thread::scope(|s| {
        s.spawn(|| {
            loop {
                let finished = done.load(Ordering::Acquire);
                let bytes = fs::read(&path).unwrap();
                let user: TestUser = serde_json::from_slice(&bytes).unwrap();
                assert!(allowed.contains(&user.email), "unexpected {}", user.email);
                reads.fetch_add(1, Ordering::Relaxed);
                if finished {
                    break;
                }
            }
        });

        for i in 0..20 {
            let mut txn = fixture.begin();
            let mut alice = fixture.read(&mut txn, "alice").unwrap().unwrap();
            alice
                .set(UserField::Email, |u| u.email = format!("v{i}@example.com"))
                .unwrap();
            fixture.update(&mut txn, &alice).unwrap();
            txn.commit().unwrap();
        }
        done.store(true, Ordering::Release);
    });

    assert!(reads.load(Ordering::Relaxed) > 0);
    assert_eq!(fixture.get("alice").unwrap().email, "v19@example.com");
}

#[test]
fn engine_commit_precedes_file_changes() {
    let fixture = TestStore::new();
    let engine = RecordingEngine::default();

    let mut txn = FileTransaction::with_engine(fixture.config(), engine.clone());
    fixture.create(&mut txn, TestUser::new("alice")).unwrap();
    txn.commit().unwrap();

    assert_eq!(engine.calls(), vec![EngineCall::Commit]);
    assert!(fixture.exists("alice").unwrap());
}

#[test]
fn engine_rollback_follows_file_cleanup() {
    let fixture = TestStore::new();
    let engine = RecordingEngine::default();

    let mut txn = FileTransaction::with_engine(fixture.config(), engine.clone());
    fixture.create(&mut txn, TestUser::new("alice")).unwrap();
    txn.rollback().unwrap();

    assert_eq!(engine.calls(), vec![EngineCall::Rollback]);
    assert!(fixture.leftovers().is_empty());
}

#[test]
fn failing_engine_blocks_file_changes() {
    let fixture = TestStore::new();
    fixture.seed([TestUser::new("bob")]);
    let engine = RecordingEngine::failing();

    let mut txn = FileTransaction::with_engine(fixture.config(), engine.clone());
    fixture.create(&mut txn, TestUser::new("alice")).unwrap();
    fixture.delete(&mut txn, "bob").unwrap();

    let err = txn.commit().unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation { .. }));
    assert_eq!(txn.state(), TransactionState::Aborted);
    assert!(!fixture.exists("alice").unwrap());
    assert!(fixture.exists("bob").unwrap());
    assert!(fixture.leftovers().is_empty());
    assert_eq!(engine.calls(), vec![EngineCall::Commit]);
}

#[test]
fn dropped_transaction_rolls_back() {
    let fixture = TestStore::new();
    let engine = RecordingEngine::default();
    {
        let mut txn = FileTransaction::with_engine(fixture.config(), engine.clone());
        fixture.create(&mut txn, TestUser::new("alice")).unwrap();
    }

    assert_eq!(engine.calls(), vec![EngineCall::Rollback]);
    assert!(fixture.leftovers().is_empty());
    assert!(!fixture.exists("alice").unwrap());
}

#[test]
fn synced_commit() {
    let fixture: TestStore = TestStore::with_config(Config::default());
    fixture.seed([TestUser::new("alice")]);

    let mut txn = fixture.begin();
    fixture.delete(&mut txn, "alice").unwrap();
    fixture.create(&mut txn, TestUser::new("bob")).unwrap();
    txn.commit().unwrap();

    assert_eq!(fixture.ids().unwrap(), vec!["bob".to_string()]);
}
