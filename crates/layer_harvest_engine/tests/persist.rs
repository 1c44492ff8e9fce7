use std::fs;

use layer_harvest_engine::{ensure_dir, recreate_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("000000.json", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "000000.json");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let second = writer.write("000000.json", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"world");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("000000.json", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("000000.json").exists());
}

#[test]
fn recreate_dir_discards_contents() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("work");
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("nested").join("old.json"), "{}").unwrap();
    fs::write(dir.join("old.json"), "{}").unwrap();

    recreate_dir(&dir).unwrap();

    assert!(dir.is_dir());
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
}
