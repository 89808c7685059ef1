use std::fs;

use tempfile::TempDir;
use tracker_engine::{
    ensure_state_dir, AtomicFileWriter, FileKeyValueStore, KeyValueStore, PersistError,
};

#[test]
fn creates_missing_state_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("state");
    assert!(!new_dir.exists());
    ensure_state_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("darkMode.json", "false").unwrap();
    let second = writer.write("darkMode.json", "true").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "true");
}

#[test]
fn state_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let store = FileKeyValueStore::new(file_path.clone());
    assert!(matches!(
        store.set("darkMode", "true"),
        Err(PersistError::StateDir(_))
    ));
}

#[test]
fn file_store_round_trips_and_removes() {
    let temp = TempDir::new().unwrap();
    let store = FileKeyValueStore::new(temp.path().join("state"));

    assert_eq!(store.get("access_token").unwrap(), None);
    store.set("access_token", "abc").unwrap();
    assert_eq!(store.get("access_token").unwrap().as_deref(), Some("abc"));
    assert!(temp.path().join("state").join("access_token.json").is_file());

    store.remove("access_token").unwrap();
    store.remove("access_token").unwrap();
    assert_eq!(store.get("access_token").unwrap(), None);
}

#[test]
fn keys_cannot_escape_the_state_dir() {
    let temp = TempDir::new().unwrap();
    let store = FileKeyValueStore::new(temp.path().to_path_buf());
    assert!(matches!(
        store.set("../outside", "x"),
        Err(PersistError::InvalidKey(_))
    ));
}
