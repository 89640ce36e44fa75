//! End-to-end CLI smoke tests: spawn the built binary against a scratch
//! config dir and database.

use assert_cmd::Command;
use predicates::str::contains;
use std::fs;

fn scratch() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("default.toml"),
        "[database]\npath = \"test.db\"\n[scope]\nallow_all_by_default = true\n[logging]\nlevel = \"info\"\n[analytics]\ndefault_preview_size = 10\n",
    )
    .unwrap();
    let db_path = dir.path().join("tracker.db");
    (dir, config_dir, db_path)
}

fn cmd(config_dir: &std::path::Path, db_path: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("nmaptracker").unwrap();
    cmd.arg("--config-dir").arg(config_dir).arg("--database").arg(db_path);
    cmd
}

#[test]
fn test_project_create_and_list() {
    let (_dir, config_dir, db_path) = scratch();

    cmd(&config_dir, &db_path)
        .args(["project", "create", "Acme"])
        .assert()
        .success()
        .stdout(contains("Acme"));

    cmd(&config_dir, &db_path).args(["project", "list"]).assert().success().stdout(contains("Acme"));
}

#[test]
fn test_scope_add_and_list() {
    let (_dir, config_dir, db_path) = scratch();

    let output = cmd(&config_dir, &db_path).args(["project", "create", "Acme"]).output().unwrap();
    let project: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let project_id = project["id"].as_str().unwrap();

    cmd(&config_dir, &db_path)
        .args(["scope", "add", project_id, "10.0.0.0/24"])
        .assert()
        .success()
        .stdout(contains("10.0.0.0/24"));

    cmd(&config_dir, &db_path).args(["scope", "list", project_id]).assert().success().stdout(contains("include"));
}

#[test]
fn test_unknown_project_delete_errors() {
    let (_dir, config_dir, db_path) = scratch();

    cmd(&config_dir, &db_path).args(["project", "delete", "does-not-exist"]).assert().failure();
}
