//! Folder items: subtree moves, record re-prefixing and prefix-scoped references.

mod common;

use std::fs;

use assert_fs::TempDir;
use common::{local, put_file, relocator, snapshot, url, FaultStore};
use media_relocate::{JsonMetadataStore, LocalFs, MetadataStore};

fn albums(root: &std::path::Path) -> JsonMetadataStore {
    put_file(root, "albums/summer/beach.jpg", "beach");
    put_file(root, "albums/summer/beach-150x150.jpg", "beach thumb");
    put_file(root, "albums/cover.jpg", "cover");
    put_file(root, "albums2/other.jpg", "other");
    fs::create_dir_all(root.join("archive")).unwrap();

    let mut store = JsonMetadataStore::in_memory();
    store
        .add_record("albums/summer/beach.jpg", &[("thumbnail", "beach-150x150.jpg")], &[])
        .unwrap();
    store.add_record("albums/cover.jpg", &[], &[]).unwrap();
    store.add_record("albums2/other.jpg", &[], &[]).unwrap();
    store
        .add_document(format!(
            r#"<a href="{}"><img src="{}"><img src="{}">"#,
            url("albums"),
            url("albums/summer/beach.jpg"),
            url("albums2/other.jpg")
        ))
        .unwrap();
    store
}

#[test]
fn subtree_records_and_references_follow_the_folder() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    let mut r = local(root, albums(root));

    let out = r.rename("albums", "archive/albums-2024").unwrap();
    assert!(out.success, "{out:?}");
    assert_eq!(out.new_path.as_deref(), Some("archive/albums-2024"));

    assert!(!root.join("albums").exists());
    assert_eq!(
        fs::read_to_string(root.join("archive/albums-2024/summer/beach.jpg")).unwrap(),
        "beach"
    );
    assert!(root.join("archive/albums-2024/summer/beach-150x150.jpg").is_file());
    assert!(root.join("archive/albums-2024/cover.jpg").is_file());

    let store = r.store();
    assert!(store.get("archive/albums-2024/summer/beach.jpg").unwrap().is_some());
    assert!(store.get("archive/albums-2024/cover.jpg").unwrap().is_some());
    assert!(store.get("albums2/other.jpg").unwrap().is_some(), "sibling with shared prefix untouched");

    let doc = &store.documents()[0].content;
    assert!(doc.contains(&format!("\"{}\"", url("archive/albums-2024"))), "{doc}");
    assert!(doc.contains(&url("archive/albums-2024/summer/beach.jpg")), "{doc}");
    assert!(doc.contains(&url("albums2/other.jpg")), "{doc}");
    assert!(r.history().is_empty());
}

#[test]
fn moving_into_own_subfolder_is_rejected_before_any_change() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    let store = albums(root);
    let before = snapshot(root);
    let mut r = local(root, store);

    let out = r.rename("albums/summer", "albums/summer/deeper").unwrap();
    assert!(!out.success);
    assert!(out.error_message.unwrap().contains("own subfolder"));
    assert_eq!(snapshot(root), before);
    assert!(r.store().get("albums/summer/beach.jpg").unwrap().is_some());
}

#[test]
fn existing_destination_folder_is_rejected() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    let mut r = local(root, albums(root));

    let out = r.rename("albums", "albums2").unwrap();
    assert!(!out.success);
    assert!(out.error_message.unwrap().contains("already exists"));
    assert!(root.join("albums/cover.jpg").is_file());
}

#[test]
fn missing_parent_is_rejected() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    let mut r = local(root, albums(root));

    let out = r.rename("albums", "nope/albums").unwrap();
    assert!(!out.success);
    assert!(out.error_message.unwrap().contains("doesn't exist"));
}

#[test]
fn empty_folder_moves_without_metadata() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    fs::create_dir_all(root.join("empty")).unwrap();
    let mut r = local(root, JsonMetadataStore::in_memory());

    assert!(r.rename("empty", "renamed").unwrap().success);
    assert!(root.join("renamed").is_dir());
    assert!(!root.join("empty").exists());
}

#[test]
fn records_outside_the_folder_are_left_alone() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    let store = FaultStore { inner: albums(root), loose_prefix: true, ..Default::default() };
    let mut r = relocator(root, store, LocalFs);

    let out = r.rename("albums", "archive/albums-2024").unwrap();
    assert!(out.success, "{out:?}");

    let store = r.store();
    assert!(store.get("archive/albums-2024/cover.jpg").unwrap().is_some());
    assert!(store.get("archive/albums-2024/summer/beach.jpg").unwrap().is_some());
    assert!(store.get("albums2/other.jpg").unwrap().is_some());
    assert_eq!(store.inner.records().len(), 3);
}
