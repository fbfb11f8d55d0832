use cloudstore_migrate::resolver::{derive_id, ResolveError};
use std::path::Path;

#[test]
fn concatenates_both_shards_and_file_name() {
    let root = Path::new("/var/lib/storage");
    let file = Path::new("/var/lib/storage/abc/def/1234-resource");
    let id = derive_id(root, file).expect("well-formed path resolves");
    assert_eq!(id, "abcdef1234-resource");
}

#[test]
fn deeper_nesting_uses_the_two_immediate_parents() {
    let root = Path::new("/srv/data");
    let file = Path::new("/srv/data/extra/level/abc/def/file.bin");
    let id = derive_id(root, file).expect("deep path resolves");
    assert_eq!(id, "abcdeffile.bin");
}

#[test]
fn file_directly_under_root_is_a_structure_error() {
    let root = Path::new("/srv/data");
    let file = Path::new("/srv/data/orphan.bin");
    let err = derive_id(root, file).unwrap_err();
    assert!(matches!(err, ResolveError::PathStructure { .. }));
}

#[test]
fn file_one_level_deep_is_a_structure_error() {
    let root = Path::new("/srv/data");
    let file = Path::new("/srv/data/abc/orphan.bin");
    assert!(derive_id(root, file).is_err());
}

#[test]
fn file_outside_the_root_is_a_structure_error() {
    let root = Path::new("/srv/data");
    let file = Path::new("/elsewhere/abc/def/file.bin");
    assert!(derive_id(root, file).is_err());
}

#[test]
fn no_validation_of_component_contents() {
    // Odd shard names still concatenate; reconciliation is what rejects them.
    let root = Path::new("/srv/data");
    let file = Path::new("/srv/data/x y/z!/weird name");
    assert_eq!(derive_id(root, file).unwrap(), "x yz!weird name");
}
