//! Tests driving the `mcm` binary.

use std::process::{Command, Output};

fn mcm(args: &[&str]) -> Output {
    mcm_with_env(args, &[])
}

fn mcm_with_env(args: &[&str], vars: &[(&str, &str)]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mcm"))
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("MCM_LOG_LEVEL")
        .envs(vars.iter().copied())
        .output()
        .unwrap()
}

#[test]
fn test_help_exits_cleanly() {
    let out = mcm(&["--help"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("--method"));
    assert!(text.contains("--scaling"));
    assert!(text.contains("--qatest"));
}

#[test]
fn test_short_help_exits_cleanly() {
    let out = mcm(&["-h"]);
    assert!(out.status.success());
    assert!(out.stderr.is_empty());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("Usage: mcm"));
    assert!(text.contains("--method"));
}

#[test]
fn test_log_level_from_environment_overrides_rust_log() {
    let args = ["--devices", "1", "--options", "4", "--paths", "1000"];
    let quiet = mcm(&args);
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("streamed pass starting"));

    let verbose = mcm_with_env(&args, &[("MCM_LOG_LEVEL", "info")]);
    let logs = String::from_utf8_lossy(&verbose.stderr);
    assert!(logs.contains("streamed pass starting"), "{logs}");
}

#[test]
fn test_qa_run_passes() {
    let out = mcm(&[
        "--qatest",
        "--devices",
        "2",
        "--options",
        "32",
        "--paths",
        "20000",
    ]);
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "{text}");
    assert!(text.contains("Number of devices       = 2"));
    assert!(text.contains("Total number of options = 64"));
    assert!(text.contains("Device statistics, threaded"));
    assert!(text.contains("Device statistics, streamed"));
    assert!(text.ends_with("Test passed\n"));
}

#[test]
fn test_fatal_errors_exit_with_one() {
    assert_eq!(mcm(&["--devices", "0"]).status.code(), Some(1));
    assert_eq!(mcm(&["--paths", "lots"]).status.code(), Some(1));
    assert_eq!(mcm(&["--options", "0", "--devices", "1"]).status.code(), Some(1));
}
