use incdiff_core::digest::HashDigest;
use incdiff_core::manifest::{self, Manifest, ScanOptions};
use incdiff_core::reconcile::reconcile;
use incdiff_core::record::StatusFlag;
use std::fs;
use std::path::Path;

fn scan(root: &Path) -> Manifest {
    Manifest::build_from_directory(root, &ScanOptions::default()).unwrap()
}

#[test]
fn unchanged_tree_reconciles_to_all_not_changed() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    fs::create_dir_all(root.join("d/e")).unwrap();
    fs::write(root.join("one"), "1").unwrap();
    fs::write(root.join("d/two"), "2").unwrap();
    fs::write(root.join("d/e/three"), "3").unwrap();

    let first = scan(root);
    let prev = manifest::parse_records(&first.serialize()).unwrap();
    let second = reconcile(scan(root), prev);

    assert_eq!(second.len(), 3);
    assert!(second.iter().all(|r| r.status == StatusFlag::NotChanged));
}

#[test]
fn edit_and_delete_are_classified() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path().join("data");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.txt"), "1").unwrap();
    fs::write(root.join("b.txt"), "2").unwrap();
    fs::write(root.join("c.txt"), "3").unwrap();
    let hashes = td.path().join("hashes.txt");
    scan(&root).save(&hashes).unwrap();

    fs::remove_file(root.join("b.txt")).unwrap();
    fs::write(root.join("a.txt"), "11").unwrap();
    fs::write(root.join("new.txt"), "n").unwrap();

    let prev = manifest::load_records(&hashes).unwrap();
    let out = reconcile(scan(&root), prev);

    let a = out.get("a.txt").unwrap();
    assert_eq!(a.status, StatusFlag::Modified);
    assert_eq!(a.hash, HashDigest::of_bytes(b"11"));

    let b = out.get("b.txt").unwrap();
    assert_eq!(b.status, StatusFlag::Deleted);
    assert_eq!(b.hash, HashDigest::of_bytes(b"2"));

    assert_eq!(out.get("c.txt").unwrap().status, StatusFlag::NotChanged);
    assert_eq!(out.get("new.txt").unwrap().status, StatusFlag::Modified);

    let s = out.summary();
    assert_eq!((s.unchanged, s.modified, s.deleted), (1, 2, 1));

    let text = out.serialize();
    assert!(text.contains(&format!("{} - b.txt\n", HashDigest::of_bytes(b"2"))));
}

#[test]
fn deleted_entries_carry_forward_once_reconciled_again() {
    // A path deleted in run N stays in run N+1's previous manifest as `-`;
    // since it is still absent it is reported deleted again.
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    fs::write(root.join("keep"), "k").unwrap();
    fs::write(root.join("drop"), "d").unwrap();
    let run1 = scan(root).serialize();

    fs::remove_file(root.join("drop")).unwrap();
    let run2 = reconcile(scan(root), manifest::parse_records(&run1).unwrap()).serialize();
    let run3 = reconcile(scan(root), manifest::parse_records(&run2).unwrap());

    assert_eq!(run3.get("drop").unwrap().status, StatusFlag::Deleted);
    assert_eq!(run3.get("keep").unwrap().status, StatusFlag::NotChanged);
}

#[test]
fn malformed_previous_line_does_not_hide_later_records() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    fs::write(root.join("a.txt"), "1").unwrap();

    let prev_text = format!(
        "{} *\n{} * a.txt\n{} * gone.txt\n",
        HashDigest::of_bytes(b"x"),
        HashDigest::of_bytes(b"1"),
        HashDigest::of_bytes(b"g"),
    );
    let out = reconcile(scan(root), manifest::parse_records(&prev_text).unwrap());
    assert_eq!(out.get("a.txt").unwrap().status, StatusFlag::NotChanged);
    assert_eq!(out.get("gone.txt").unwrap().status, StatusFlag::Deleted);
}

#[cfg(unix)]
#[test]
fn paths_with_edge_whitespace_reconcile_as_unchanged() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    fs::write(root.join(" lead.txt"), "1").unwrap();
    fs::write(root.join("trail.txt "), "2").unwrap();
    fs::write(root.join("\u{a0}nbsp.txt"), "3").unwrap();

    let prev = manifest::parse_records(&scan(root).serialize()).unwrap();
    let second = reconcile(scan(root), prev);

    assert_eq!(second.len(), 3);
    assert!(second.get(" lead.txt").is_some());
    assert!(second.iter().all(|r| r.status == StatusFlag::NotChanged), "{}", second.serialize());
}
