use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DATABASE_ENV: &str = "LINKS_CATEGORY__GENERAL__DATABASE_PATH";

fn run_with_db(db: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("links-category");
    cmd.env(DATABASE_ENV, db).args(args).assert()
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    let mut cmd = cargo_bin_cmd!("links-category");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("database_path"));
    assert!(content.contains("show_onebox_in_post = true"));

    let mut cmd = cargo_bin_cmd!("links-category");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn normalize_prepends_scheme() {
    let mut cmd = cargo_bin_cmd!("links-category");
    cmd.args(["normalize", "example.com/page"])
        .assert()
        .success()
        .stdout("http://example.com/page\n");
}

#[test]
fn normalize_outputs_valid_json() {
    let mut cmd = cargo_bin_cmd!("links-category");
    let output = cmd
        .args(["normalize", "https://www.Example.com/x", "--json"])
        .output()
        .expect("run normalize");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["normalized"], "https://www.example.com/x");
    assert_eq!(value["domain"], "example.com");
}

#[test]
fn normalize_rejects_invalid_link() {
    let mut cmd = cargo_bin_cmd!("links-category");
    cmd.args(["normalize", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("links_category.invalid_link"));
}

#[test]
fn domain_strips_www() {
    let mut cmd = cargo_bin_cmd!("links-category");
    cmd.args(["domain", "https://www.Example.com/x"])
        .assert()
        .success()
        .stdout("example.com\n");
}

#[test]
fn category_create_and_list() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("forum.sqlite");

    run_with_db(&db, &["category", "create", "--name", "Links", "--links-only"])
        .success()
        .stdout(predicate::str::contains("links only: true"));
    run_with_db(&db, &["category", "create", "--name", "General"]).success();

    let mut cmd = cargo_bin_cmd!("links-category");
    let output = cmd
        .env(DATABASE_ENV, &db)
        .args(["category", "list", "--json"])
        .output()
        .expect("run category list");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["count"], 2);
    assert_eq!(value["categories"][0]["name"], "Links");
    assert_eq!(value["categories"][0]["links_only"], true);
    assert_eq!(value["categories"][1]["links_only"], false);
}

#[test]
fn category_set_links_only_toggles_policy() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("forum.sqlite");

    run_with_db(&db, &["category", "create", "--name", "News"]).success();
    run_with_db(&db, &["category", "set-links-only", "1", "true"])
        .success()
        .stdout(predicate::str::contains("links only: true"));

    run_with_db(&db, &["category", "list"])
        .success()
        .stdout(predicate::str::contains("News [links]"));

    run_with_db(&db, &["category", "set-links-only", "42", "true"])
        .failure()
        .stderr(predicate::str::contains("Failed to update category"));
}

#[test]
fn user_create_rejects_duplicates() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("forum.sqlite");

    run_with_db(&db, &["user", "create", "--username", "alice", "--moderator"])
        .success()
        .stdout(predicate::str::contains("staff: true"));
    run_with_db(&db, &["user", "create", "--username", "Alice"])
        .failure()
        .stderr(predicate::str::contains("Failed to create user"));
}
