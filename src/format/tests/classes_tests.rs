//! Tests for the `classes.txt` registry.

use std::fs;

use tempfile::TempDir;

use crate::format::{CLASS_FILE, ClassTable};

#[test]
fn ids_follow_first_seen_order() {
    let mut table = ClassTable::default();

    assert_eq!(table.resolve_or_insert("cat"), Some(0));
    assert_eq!(table.resolve_or_insert("dog"), Some(1));
    assert_eq!(table.resolve_or_insert("cat"), Some(0));
    assert_eq!(table.len(), 2);
}

#[test]
fn empty_names_are_never_registered() {
    let mut table = ClassTable::default();

    assert_eq!(table.resolve_or_insert(""), None);
    assert_eq!(table.resolve_or_insert("   "), None);
    assert!(table.is_empty());

    // Trimming means "  cat " and "cat" are the same class.
    assert_eq!(table.resolve_or_insert("  cat "), Some(0));
    assert_eq!(table.id_of("cat"), Some(0));
}

#[test]
fn ids_are_stable_across_save_and_reload() {
    let dir = TempDir::new().expect("temp dir");

    let mut table = ClassTable::load(dir.path()).expect("load empty");
    table.resolve_or_insert("cat");
    table.resolve_or_insert("dog");
    table.save(dir.path()).expect("save");

    // A later session that only mentions "cat" must not renumber "dog".
    let mut reloaded = ClassTable::load(dir.path()).expect("reload");
    assert_eq!(reloaded.resolve_or_insert("cat"), Some(0));
    reloaded.save(dir.path()).expect("save again");

    let content = fs::read_to_string(dir.path().join(CLASS_FILE)).expect("read classes.txt");
    assert_eq!(content, "cat\ndog\n");
}

#[test]
fn new_names_append_after_existing_ones() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join(CLASS_FILE), "person\ncar\n").expect("seed file");

    let mut table = ClassTable::load(dir.path()).expect("load");
    assert_eq!(table.id_of("car"), Some(1));
    assert_eq!(table.resolve_or_insert("bicycle"), Some(2));

    table.save(dir.path()).expect("save");
    let content = fs::read_to_string(dir.path().join(CLASS_FILE)).expect("read");
    assert_eq!(content, "person\ncar\nbicycle\n");
}

#[test]
fn name_lookup_by_id() {
    let mut table = ClassTable::default();
    table.resolve_or_insert("cat");
    table.resolve_or_insert("dog");

    assert_eq!(table.name_of(0), Some("cat"));
    assert_eq!(table.name_of(1), Some("dog"));
    assert_eq!(table.name_of(7), None);
}
