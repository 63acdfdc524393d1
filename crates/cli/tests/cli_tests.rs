use std::{fs, path::PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

/// A config that disables the host-dependent provider so runs are deterministic.
fn config(extra: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.yaml");
    fs::write(&path, format!("disabled_providers: [azure]\n{extra}")).expect("write config");
    (dir, path)
}

fn cliapi(config_path: &PathBuf) -> assert_cmd::Command {
    let mut command = cargo_bin_cmd!("cliapi");
    command.env("CLIAPI_CONFIG_PATH", config_path).env_remove("RUST_LOG");
    command
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn lists_providers_and_apis() {
    let (_dir, path) = config("");
    let output = cliapi(&path).arg("--list-providers").output().expect("run");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!(["test"]));

    let output = cliapi(&path).arg("--list-apis").output().expect("run");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!(["test", "meta_data", "some_stuff"]));
}

#[test]
fn scoop_item_prints_bare_value() {
    let (_dir, path) = config("");
    let output = cliapi(&path).arg("--item=mac").output().expect("run");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!("000D3A3AE8A5"));
}

#[test]
fn command_line_option_overrides_default() {
    let (_dir, path) = config("");
    let output = cliapi(&path)
        .args(["--smurf=papa", "--api_version=2020-01-01", "--item=some_stuff", "--item=key1"])
        .output()
        .expect("run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output), json!(["2020-01-01", null]));
}

#[test]
fn missing_required_option_prints_help_and_exits_2() {
    let (_dir, path) = config("");
    cliapi(&path)
        .arg("--item=vmSize")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--smurf"))
        .stdout(predicate::str::contains("-REQUIRED-"));
}

#[test]
fn unknown_option_is_a_usage_error() {
    let (_dir, path) = config("");
    cliapi(&path)
        .arg("--region=westus")
        .assert()
        .code(2)
        .stdout(predicate::str::starts_with("usage: cliapi"));
}

#[test]
fn malformed_item_query_prints_help_and_exits_2() {
    let (_dir, path) = config("options:\n  test:\n    smurf: papa\n");
    cliapi(&path)
        .arg("--item=compute..name")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("malformed query 'compute..name'"))
        .stdout(predicate::str::starts_with("usage: cliapi"))
        .stdout(predicate::str::contains("Common CLI options:"));
}

#[test]
fn path_item_matches_right_most_steps() {
    let (_dir, path) = config("options:\n  test:\n    smurf: papa\n");
    let output = cliapi(&path)
        .args(["--item=compute.name", "--item=interface[0].macAddress", "--item=meta_data.compute.location"])
        .output()
        .expect("run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output), json!(["ed-sle12sp3byos", "000D3A3AE8A5", "westus"]));
}

#[cfg(unix)]
#[test]
fn non_utf8_argument_is_a_usage_error() {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

    let (_dir, path) = config("");
    cliapi(&path)
        .arg(OsStr::from_bytes(b"--smurf=pa\xffpa"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid UTF-8"))
        .stdout(predicate::str::starts_with("usage: cliapi"));
}

#[test]
fn configured_options_act_as_defaults() {
    let (_dir, path) = config("options:\n  test:\n    smurf: papa\n    dufus: config\n");
    let output = cliapi(&path).args(["--all", "--dufus=cli"]).output().expect("run");
    assert!(output.status.success());
    let all = stdout_json(&output);
    assert_eq!(all["test"], json!(["papa", "cli", "baz"]));
    assert_eq!(all["some_stuff"], json!("2017-08-01"));
    assert_eq!(all["meta_data"]["compute"]["name"], json!("ed-sle12sp3byos"));
}

#[test]
fn help_shows_defaults_and_common_options() {
    let (_dir, path) = config("");
    cliapi(&path)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("default='2017-08-01'"))
        .stdout(predicate::str::contains("Common CLI options:"))
        .stdout(predicate::str::contains("--list-providers"));
}

#[test]
fn no_selection_prints_empty_list() {
    let (_dir, path) = config("");
    let output = cliapi(&path).output().expect("run");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!([]));
}

#[test]
fn unknown_provider_is_reported() {
    let (_dir, path) = config("");
    cliapi(&path)
        .arg("--provider=azure")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no provider named 'azure'"));
}
