//! End-to-end tests for the statekit binary.
//!
//! Each test runs the compiled binary inside a temporary workspace and checks
//! both the terminal output and the state files left on disk.

use assert_cmd::Command;
use predicates::prelude::*;
use statekit_test_utils::{StateBuilder, TestWorkspace, attribute_id};

const STATE: &str = "terraform.tfstate";

fn statekit(ws: &TestWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("statekit").unwrap();
    cmd.current_dir(ws.root());
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

fn seeded() -> TestWorkspace {
    let ws = TestWorkspace::new();
    ws.write_state(
        STATE,
        &StateBuilder::new()
            .instance("test_instance.foo", "bar")
            .instance("test_instance.baz", "foo")
            .build(),
    );
    ws
}

#[test]
fn help_lists_commands() {
    let ws = TestWorkspace::new();
    statekit(&ws)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mv"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn no_command_prints_hint() {
    let ws = TestWorkspace::new();
    statekit(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("statekit --help"));
}

#[test]
fn mv_renames_resource() {
    let ws = seeded();

    statekit(&ws)
        .args(["mv", "test_instance.foo", "test_instance.bar"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "\"test_instance.foo\" to \"test_instance.bar\"",
        ))
        .stdout(predicate::str::contains("Successfully moved 1 object(s)."));

    assert_eq!(
        ws.addresses(STATE),
        vec!["test_instance.bar", "test_instance.baz"]
    );
    assert_eq!(
        attribute_id(&ws.read_state(STATE), "test_instance.bar").as_deref(),
        Some("bar")
    );
    assert_eq!(ws.backups().len(), 1);
}

#[test]
fn mv_no_backup_leaves_no_backup() {
    let ws = seeded();

    statekit(&ws)
        .args(["mv", "--no-backup", "test_instance.foo", "test_instance.bar"])
        .assert()
        .success();

    assert!(ws.backups().is_empty());
}

#[test]
fn mv_explicit_state_and_backup() {
    let ws = TestWorkspace::new();
    ws.write_state(
        "envs/prod.tfstate",
        &StateBuilder::new().instance("test_instance.foo", "bar").build(),
    );
    let original = ws.read_raw("envs/prod.tfstate");

    statekit(&ws)
        .args([
            "mv",
            "--state",
            "envs/prod.tfstate",
            "--backup",
            "prod.saved",
            "test_instance.foo",
            "test_instance.bar",
        ])
        .assert()
        .success();

    assert_eq!(ws.addresses("envs/prod.tfstate"), vec!["test_instance.bar"]);
    assert_eq!(ws.read_raw("prod.saved"), original);
    ws.assert_file_not_exists(STATE);
}

#[test]
fn mv_into_new_state_out() {
    let ws = seeded();

    statekit(&ws)
        .args([
            "mv",
            "--state-out",
            "other.tfstate",
            "test_instance.foo",
            "test_instance.foo",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully moved 1 object(s)."));

    assert_eq!(ws.addresses(STATE), vec!["test_instance.baz"]);
    assert_eq!(ws.addresses("other.tfstate"), vec!["test_instance.foo"]);
    assert_eq!(ws.read_state("other.tfstate").serial, 1);
    // only the pre-existing source is backed up
    assert_eq!(ws.backups().len(), 1);
}

#[test]
fn mv_same_address_is_noop() {
    let ws = seeded();
    let before = ws.addresses(STATE);

    statekit(&ws)
        .args(["mv", "test_instance.foo", "test_instance.foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to move"));

    assert_eq!(ws.addresses(STATE), before);
    assert_eq!(ws.read_state(STATE).serial, 1);
}

#[test]
fn mv_type_mismatch_fails_without_writing() {
    let ws = seeded();
    let before = ws.read_raw(STATE);

    statekit(&ws)
        .args(["mv", "test_instance.foo", "other_instance.bar"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("resource types don't match"));

    assert_eq!(ws.read_raw(STATE), before);
    assert!(ws.backups().is_empty());
}

#[test]
fn mv_missing_state_fails() {
    let ws = TestWorkspace::new();

    statekit(&ws)
        .args(["mv", "test_instance.foo", "test_instance.bar"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No state file was found"));
}

#[test]
fn mv_malformed_address_fails() {
    let ws = seeded();

    statekit(&ws)
        .args(["mv", "test_instance.foo[", "test_instance.bar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed address"));
}

#[test]
fn mv_warns_about_dangling_dependencies() {
    let ws = TestWorkspace::new();
    ws.write_state(
        STATE,
        &StateBuilder::new()
            .instance("test_instance.foo", "bar")
            .dependent("test_instance.baz", "foo", &["test_instance.foo"])
            .build(),
    );

    statekit(&ws)
        .args(["mv", "test_instance.foo", "test_instance.bar"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning"))
        .stderr(predicate::str::contains("test_instance.baz"));
}

#[test]
fn mv_honors_config_file() {
    let ws = TestWorkspace::new();
    ws.write(
        "statekit.toml",
        b"[state]\npath = \"prod.tfstate\"\n\n[backup]\nenabled = false\n",
    );
    ws.write_state(
        "prod.tfstate",
        &StateBuilder::new().instance("test_instance.foo", "bar").build(),
    );

    statekit(&ws)
        .args(["mv", "test_instance.foo", "test_instance.bar"])
        .assert()
        .success();

    assert_eq!(ws.addresses("prod.tfstate"), vec!["test_instance.bar"]);
    assert!(ws.backups().is_empty());
}

#[test]
fn invalid_config_is_reported() {
    let ws = seeded();
    ws.write("statekit.toml", b"[backup]\nkeep = 3\n");

    statekit(&ws)
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn list_prints_every_instance() {
    let ws = TestWorkspace::new();
    ws.write_state(
        STATE,
        &StateBuilder::new()
            .counted("test_instance.foo", 2, "foo")
            .instance("module.app.test_instance.web", "web")
            .build(),
    );

    statekit(&ws)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("test_instance.foo[0]\n"))
        .stdout(predicate::str::contains("test_instance.foo[1]\n"))
        .stdout(predicate::str::contains("module.app.test_instance.web\n"));
}

#[test]
fn list_filters_by_module() {
    let ws = TestWorkspace::new();
    ws.write_state(
        STATE,
        &StateBuilder::new()
            .instance("test_instance.foo", "foo")
            .instance("module.app.test_instance.web", "web")
            .build(),
    );

    statekit(&ws)
        .args(["list", "module.app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("module.app.test_instance.web"))
        .stdout(predicate::str::contains("test_instance.foo").not());
}
