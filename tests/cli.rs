use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("bodega")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mirror"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("cache"))
        .stdout(predicate::str::contains("Inspect or clean the shared fetch cache"));
}

#[test]
fn init_writes_starter_inventory_once() {
    let tmp = tempfile::tempdir().unwrap();

    Command::cargo_bin("bodega")
        .unwrap()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success();
    assert!(tmp.path().join("inventory.yml").exists());

    Command::cargo_bin("bodega")
        .unwrap()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn list_reports_empty_mirror() {
    let tmp = tempfile::tempdir().unwrap();

    Command::cargo_bin("bodega")
        .unwrap()
        .current_dir(tmp.path())
        .args(["list", "--directory", "mirror"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no cookbooks mirrored"));
}

#[test]
fn mirror_fails_without_inventory() {
    let tmp = tempfile::tempdir().unwrap();

    Command::cargo_bin("bodega")
        .unwrap()
        .current_dir(tmp.path())
        .arg("mirror")
        .assert()
        .failure()
        .stderr(predicate::str::contains("load inventory"));
}

#[test]
fn mirror_with_empty_inventory_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("inventory.yml"), "sources: []\ncookbooks: {}\n").unwrap();

    Command::cargo_bin("bodega")
        .unwrap()
        .current_dir(tmp.path())
        .arg("mirror")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));
}
