//! Integration tests for the command line surface that do not need node.

use std::fs;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vue-template-rs"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run vue-template-rs")
}

#[test]
fn help_lists_the_main_flags() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--workspace", "--production", "--out-dir", "--fail-on-warnings", "--node"] {
        assert!(stdout.contains(flag), "missing {flag} in:\n{stdout}");
    }
}

#[test]
fn missing_node_binary_fails() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = dir.path().to_str().unwrap();
    let output = run(&["--workspace", workspace, "--node", "/definitely/not/here/node"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("node binary not found"), "{stderr}");
}

#[test]
fn invalid_config_fails_before_compiling() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("vue-template.config.json"), "{ \"root\": 1 }").unwrap();
    let workspace = dir.path().to_str().unwrap();
    let output = run(&["--workspace", workspace, "--node", "/definitely/not/here/node"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid config"), "{stderr}");
}

#[test]
fn invalid_ignore_glob_fails() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = dir.path().to_str().unwrap();
    let output = run(&["--workspace", workspace, "--ignore", "src/["]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid glob pattern"), "{stderr}");
}
