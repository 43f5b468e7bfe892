//! Integration tests for the file-backed credential store

use argos_common::config::CredentialSettings;
use argos_common::credentials::{legacy_hash, CredentialStore, StoredCredential, VerifyOutcome};
use argos_common::Error;
use std::path::Path;
use tempfile::TempDir;

/// Low iteration count keeps the tests fast
fn settings() -> CredentialSettings {
    CredentialSettings {
        pbkdf2_iterations: 1_000,
        ..CredentialSettings::default()
    }
}

fn store_in(dir: &TempDir) -> CredentialStore {
    CredentialStore::new(dir.path().join("user_credentials.json"), settings())
}

fn read_file(path: &Path) -> StoredCredential {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn write_legacy(path: &Path, username: &str, password: &str) {
    let legacy = serde_json::json!({
        "username": username,
        "password_hash": legacy_hash(password),
    });
    std::fs::write(path, legacy.to_string()).unwrap();
}

#[tokio::test]
async fn test_missing_file_is_provisioned_with_default_account() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let outcome = store.verify_and_maybe_upgrade("test").await.unwrap();

    assert_eq!(outcome, VerifyOutcome { ok: true, upgraded: false });
    let stored = read_file(store.path());
    assert_eq!(stored.username, "test");
    assert!(!stored.is_legacy());
}

#[tokio::test]
async fn test_wrong_password_fails_without_upgrade() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let outcome = store.verify_and_maybe_upgrade("wrong").await.unwrap();

    assert_eq!(outcome, VerifyOutcome { ok: false, upgraded: false });
}

#[tokio::test]
async fn test_legacy_hash_is_upgraded_on_successful_verify() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    write_legacy(store.path(), "ops", "hunter2");

    let outcome = store.verify_and_maybe_upgrade("hunter2").await.unwrap();
    assert_eq!(outcome, VerifyOutcome { ok: true, upgraded: true });

    let stored = read_file(store.path());
    assert!(stored.salt().is_some_and(|s| !s.is_empty()));
    assert_ne!(stored.password_hash, legacy_hash("hunter2"));
    assert_eq!(stored.username, "ops");

    // Same plaintext still accepted, now through the salted path
    let again = store.verify_and_maybe_upgrade("hunter2").await.unwrap();
    assert_eq!(again, VerifyOutcome { ok: true, upgraded: false });
}

#[tokio::test]
async fn test_legacy_hash_not_upgraded_on_failed_verify() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    write_legacy(store.path(), "ops", "hunter2");

    let outcome = store.verify_and_maybe_upgrade("nope").await.unwrap();

    assert!(!outcome.ok);
    assert!(read_file(store.path()).is_legacy());
}

#[tokio::test]
async fn test_authenticate_rejects_wrong_username_and_password_alike() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    assert!(store.authenticate("test", "test").await.is_ok());
    assert!(matches!(store.authenticate("admin", "test").await, Err(Error::Authentication)));
    assert!(matches!(store.authenticate("test", "nope").await, Err(Error::Authentication)));
}

#[tokio::test]
async fn test_rejected_login_leaves_legacy_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    write_legacy(store.path(), "test", "hunter2");
    let before = read_file(store.path());

    let err = store.authenticate("admin", "hunter2").await.unwrap_err();

    assert!(matches!(err, Error::Authentication));
    assert_eq!(read_file(store.path()), before);
    assert!(read_file(store.path()).is_legacy());

    let outcome = store.authenticate("test", "hunter2").await.unwrap();
    assert_eq!(outcome, VerifyOutcome { ok: true, upgraded: true });
}

#[tokio::test]
async fn test_rotate_generates_fresh_salt() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.ensure_storage().await.unwrap();
    let before = read_file(store.path());

    store.rotate("test").await.unwrap();
    let after = read_file(store.path());

    assert_ne!(before.salt, after.salt);
    assert_ne!(before.password_hash, after.password_hash);
    assert!(store.verify_and_maybe_upgrade("test").await.unwrap().ok);
}

#[tokio::test]
async fn test_change_password() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.change_password("test", "n3w-pass").await.unwrap();

    assert!(!store.verify_and_maybe_upgrade("test").await.unwrap().ok);
    assert!(store.verify_and_maybe_upgrade("n3w-pass").await.unwrap().ok);
}

#[tokio::test]
async fn test_change_password_with_wrong_old_password_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.ensure_storage().await.unwrap();
    let before = read_file(store.path());

    let err = store.change_password("wrong", "n3w-pass").await.unwrap_err();

    assert!(matches!(err, Error::Authentication));
    assert_eq!(read_file(store.path()), before);
}

#[tokio::test]
async fn test_change_password_from_legacy_storage() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    write_legacy(store.path(), "ops", "old");

    store.change_password("old", "new").await.unwrap();

    let stored = read_file(store.path());
    assert!(!stored.is_legacy());
    assert!(store.authenticate("ops", "new").await.is_ok());
}
