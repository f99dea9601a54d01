use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let store = dir.path().join("state.json");
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        format!("paths:\n  store: {}\n", store.display()),
    )
    .expect("write config");
    config_path
}

#[test]
fn status_json_is_empty_for_a_fresh_store() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir);

    let mut cmd = Command::cargo_bin("downport").expect("binary");
    cmd.arg("--config")
        .arg(&config)
        .arg("status")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn status_table_points_at_intake_when_empty() {
    let dir = TempDir::new().expect("tempdir");
    let config = write_config(&dir);

    let mut cmd = Command::cargo_bin("downport").expect("binary");
    cmd.arg("--config")
        .arg(&config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No syncs tracked"));
}

#[test]
fn missing_config_file_is_an_error() {
    let mut cmd = Command::cargo_bin("downport").expect("binary");
    cmd.arg("--config")
        .arg("/nonexistent/config.yaml")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}
