//! # Archivetar CLI Lists Integration Tests
//!
//! File: cli/tests/lists.rs
//!
//! `archivetar lists` end to end: batch files on disk, printed pairs, and the
//! failure modes for bad input.
//!

mod common;
use common::*;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_lists_splits_listing() {
    let temp = tempdir().unwrap();
    let (listing, paths) = write_tree_and_listing(temp.path(), &[("a", 6), ("b", 6), ("c", 1)]);

    archivetar_cmd()
        .current_dir(temp.path())
        .args(["lists", "walk.txt", "--prefix", "proj", "--size", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("proj-1.index.txt"))
        .stdout(predicate::str::contains("proj-3.tartmp.txt"));

    for (i, path) in paths.iter().enumerate() {
        let manifest = fs::read_to_string(temp.path().join(format!("proj-{}.tartmp.txt", i + 1))).unwrap();
        assert_eq!(manifest, format!("{}\n", path.display()));
    }
    let rebuilt: String = (1..=3)
        .map(|n| fs::read_to_string(temp.path().join(format!("proj-{}.index.txt", n))).unwrap())
        .collect();
    assert_eq!(rebuilt, fs::read_to_string(listing).unwrap());
    assert!(!temp.path().join("proj-4.tartmp.txt").exists());
}

#[test]
fn test_lists_output_dir() {
    let temp = tempdir().unwrap();
    let (listing, _) = write_tree_and_listing(temp.path(), &[("a", 1), ("b", 1)]);
    let out = temp.path().join("lists");

    archivetar_cmd()
        .arg("lists")
        .arg(&listing)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let manifest = fs::read_to_string(out.join("archivetar-1.tartmp.txt")).unwrap();
    assert_eq!(manifest.lines().count(), 2);
}

#[test]
fn test_lists_missing_listing() {
    let temp = tempdir().unwrap();
    archivetar_cmd()
        .current_dir(temp.path())
        .args(["lists", "missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist or is not a regular file"));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn test_lists_stops_at_malformed_line() {
    let temp = tempdir().unwrap();
    let good = listing_line(10, std::path::Path::new("/data/one"));
    fs::write(
        temp.path().join("walk.txt"),
        format!("{}garbage line\n{}", good, good),
    )
    .unwrap();

    archivetar_cmd()
        .current_dir(temp.path())
        .args(["lists", "walk.txt", "--size", "5B"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error on line 2"));

    // The batch closed before the bad line is complete and left in place.
    assert_eq!(
        fs::read_to_string(temp.path().join("archivetar-1.index.txt")).unwrap(),
        good
    );
    assert!(!temp.path().join("archivetar-2.index.txt").exists());
}

#[test]
fn test_lists_rejects_bad_size() {
    let temp = tempdir().unwrap();
    write_tree_and_listing(temp.path(), &[("a", 1)]);
    archivetar_cmd()
        .current_dir(temp.path())
        .args(["lists", "walk.txt", "--size", "10 parsecs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid size"));
}
