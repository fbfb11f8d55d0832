use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn help_lists_all_commands() {
    let mut cmd = Command::cargo_bin("cloudstore-migrate").expect("binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("migrate")
                .and(predicate::str::contains("fix-cors"))
                .and(predicate::str::contains("initdb")),
        );
}

#[test]
fn missing_subcommand_is_an_error() {
    let mut cmd = Command::cargo_bin("cloudstore-migrate").expect("binary exists");
    cmd.assert().failure();
}

#[test]
fn migrate_with_unreadable_config_fails_with_diagnostics() {
    let storage = tempdir().expect("temp storage root");
    let mut cmd = Command::cargo_bin("cloudstore-migrate").expect("binary exists");
    cmd.arg("migrate")
        .arg("--config")
        .arg("/definitely/not/here.yaml")
        .arg(storage.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn fix_cors_requires_at_least_one_origin() {
    let config = NamedTempFile::new().expect("temp config");
    write(
        config.path(),
        b"catalog:\n  base_url: http://127.0.0.1:1\ndriver:\n  name: basic\n  endpoint: http://127.0.0.1:1\n  container: resources\n",
    )
    .expect("write config");

    let mut cmd = Command::cargo_bin("cloudstore-migrate").expect("binary exists");
    cmd.arg("fix-cors").arg("--config").arg(config.path());
    cmd.assert().failure();
}

#[test]
fn fix_cors_on_basic_driver_reports_and_exits_zero() {
    let config = NamedTempFile::new().expect("temp config");
    write(
        config.path(),
        b"catalog:\n  base_url: http://127.0.0.1:1\ndriver:\n  name: basic\n  endpoint: http://127.0.0.1:1\n  container: resources\n  advanced_rules: false\n",
    )
    .expect("write config");

    let mut cmd = Command::cargo_bin("cloudstore-migrate").expect("binary exists");
    cmd.arg("fix-cors")
        .arg("--config")
        .arg(config.path())
        .arg("https://example.org");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("does not currently support"));
}
