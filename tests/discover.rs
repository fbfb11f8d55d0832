use cloudstore_migrate::discover::{discover, discover_files, into_batch};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn leaf_file(root: &Path, shard1: &str, shard2: &str, name: &str) {
    let dir = root.join(shard1).join(shard2);
    fs::create_dir_all(&dir).expect("create shard dirs");
    fs::write(dir.join(name), b"content").expect("write leaf file");
}

#[test]
fn every_leaf_file_yields_exactly_one_entry() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    leaf_file(root, "abc", "def", "1234-resource");
    leaf_file(root, "abc", "def", "5678-other");
    leaf_file(root, "ghi", "jkl", "9999-third");

    let batch = discover(root).expect("readable root");
    assert_eq!(batch.len(), 3);
    assert_eq!(
        batch["abcdef1234-resource"],
        root.join("abc/def/1234-resource")
    );
    assert!(batch.contains_key("abcdef5678-other"));
    assert!(batch.contains_key("ghijkl9999-third"));
}

#[test]
fn directories_without_files_contribute_nothing() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("aaa/bbb")).unwrap();
    fs::create_dir_all(root.join("ccc")).unwrap();

    let batch = discover(root).unwrap();
    assert!(batch.is_empty());
}

#[test]
fn files_outside_the_sharding_structure_are_skipped() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    leaf_file(root, "abc", "def", "1234-resource");
    fs::write(root.join("stray.txt"), b"x").unwrap();
    fs::create_dir_all(root.join("one")).unwrap();
    fs::write(root.join("one/too-shallow.txt"), b"x").unwrap();

    let batch = discover(root).unwrap();
    assert_eq!(batch.len(), 1);
    assert!(batch.contains_key("abcdef1234-resource"));
}

#[test]
fn batch_size_never_exceeds_file_count() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    leaf_file(root, "abc", "def", "a");
    leaf_file(root, "abc", "def", "b");

    let files = discover_files(root).unwrap();
    let batch = into_batch(files.clone());
    assert!(batch.len() <= files.len());
    assert_eq!(batch.len(), 2);
}

#[test]
fn collisions_keep_the_last_discovered_file_deterministically() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    // Both derive the id `abcdefx`: the no-separator scheme makes shard
    // boundaries ambiguous.
    leaf_file(root, "ab", "cdef", "x");
    leaf_file(root, "abc", "def", "x");

    let files = discover_files(root).unwrap();
    assert_eq!(files.len(), 2);

    let batch = into_batch(files);
    assert_eq!(batch.len(), 1);
    // Sorted traversal visits `ab/` before `abc/`, so the `abc/def/x` copy
    // is discovered last and wins, on every run.
    assert_eq!(batch["abcdefx"], root.join("abc/def/x"));
}

#[test]
fn unreadable_root_is_an_error() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("nope");
    assert!(discover(&missing).is_err());
}
