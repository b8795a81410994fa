//! Batch moves: independent items, per-item reasons, interruption.

mod common;

use std::fs;

use assert_fs::TempDir;
use common::{local, put_file, relocator, FaultFs};
use media_relocate::{shutdown, JsonMetadataStore, MetadataStore};
use serial_test::serial;

fn three_files(root: &std::path::Path) -> JsonMetadataStore {
    put_file(root, "inbox/x.jpg", "x");
    put_file(root, "inbox/y.jpg", "y");
    put_file(root, "inbox/z.jpg", "z");
    put_file(root, "sorted/y.jpg", "already here");
    let mut store = JsonMetadataStore::in_memory();
    for name in ["x", "y", "z"] {
        store.add_record(&format!("inbox/{name}.jpg"), &[], &[]).unwrap();
    }
    store
}

#[test]
#[serial]
fn one_failure_does_not_stop_the_others() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    let mut r = local(root, three_files(root));

    let out = r
        .move_items(&["inbox/x.jpg", "inbox/y.jpg", "inbox/z.jpg"], "sorted")
        .unwrap();
    assert_eq!(out.successful, vec!["sorted/x.jpg", "sorted/z.jpg"]);
    assert_eq!(out.failed.len(), 1);
    assert_eq!(out.failed[0].path, "inbox/y.jpg");
    assert!(out.failed[0].reason.contains("already exists"));
    assert!(out.status());
    assert!(!out.all_succeeded());

    assert_eq!(fs::read_to_string(root.join("sorted/y.jpg")).unwrap(), "already here");
    assert!(root.join("inbox/y.jpg").is_file());
    assert!(r.store().get("sorted/x.jpg").unwrap().is_some());
    assert!(r.store().get("inbox/y.jpg").unwrap().is_some());
    assert!(r.history().is_empty());
}

#[test]
#[serial]
fn missing_item_is_reported_with_reason() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    let mut r = local(root, three_files(root));

    let out = r.move_items(&["inbox/ghost.jpg", "inbox/x.jpg"], "sorted").unwrap();
    assert_eq!(out.successful, vec!["sorted/x.jpg"]);
    assert_eq!(out.failed[0].path, "inbox/ghost.jpg");
    assert!(out.failed[0].reason.contains("ghost.jpg"), "{}", out.failed[0].reason);
}

#[test]
#[serial]
fn failed_rollback_stops_remaining_items() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    let mut store = three_files(root);
    // First item's primary moves; the second forward rename fails and cannot be undone.
    put_file(root, "inbox/x-150x150.jpg", "thumb");
    let mut rec = store.get("inbox/x.jpg").unwrap().unwrap();
    rec.sizes.insert("thumbnail".into(), "x-150x150.jpg".into());
    store.put("inbox/x.jpg", rec).unwrap();

    let fs = FaultFs { fail_rename: Some(2), fail_reverse: true, ..Default::default() };
    let mut r = relocator(root, store, fs);

    let out = r.move_items(&["inbox/x.jpg", "inbox/z.jpg"], "sorted").unwrap();
    assert!(!out.status());
    assert_eq!(out.unrecoverable.len(), 1);
    assert!(out.successful.is_empty());
    assert_eq!(out.failed[1].path, "inbox/z.jpg");
    assert!(out.failed[1].reason.contains("not attempted"));
    assert!(root.join("inbox/z.jpg").is_file());
}

#[test]
#[serial]
fn interruption_fails_items_that_were_not_started() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    let mut r = local(root, three_files(root));

    shutdown::request();
    let out = r.move_items(&["inbox/x.jpg", "inbox/z.jpg"], "sorted");
    shutdown::reset();

    let out = out.unwrap();
    assert!(out.successful.is_empty());
    assert!(out.failed.iter().all(|f| f.reason == "interrupted"));
    assert!(root.join("inbox/x.jpg").is_file());
    assert!(r.history().is_empty());
}

#[test]
#[serial]
fn larger_batches_are_processed_in_chunks() {
    let td = TempDir::new().unwrap();
    let root = td.path();
    fs::create_dir_all(root.join("dest")).unwrap();
    let names: Vec<String> = (0..5).map(|i| format!("f{i}.txt")).collect();
    for n in &names {
        put_file(root, n, n);
    }
    let mut r = local(root, JsonMetadataStore::in_memory());

    let out = r.move_items(&names, "dest").unwrap();
    assert!(out.all_succeeded());
    assert_eq!(out.successful.len(), 5);
    for n in &names {
        assert!(root.join("dest").join(n).is_file());
    }
}
