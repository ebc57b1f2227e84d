//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    run_cli_with_input(home, args, "")
}

fn run_cli_with_input(home: &Path, args: &[&str], input: &str) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_focustimer"))
        .args(args)
        .env("HOME", home)
        .env("FOCUSTIMER_ENV", "dev")
        .env("FOCUSTIMER_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

#[test]
fn test_config_get_default() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "timer.focus_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_set_persists() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "notifications.sound", "false"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "notifications.sound"]);
    assert_eq!(stdout.trim(), "false");
}

#[test]
fn test_config_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "theme"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: unknown key"));
}

#[test]
fn test_config_keys() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "keys"]);
    assert_eq!(code, 0);
    assert!(stdout.lines().any(|l| l == "timer.long_break_interval"));
    assert!(stdout.lines().any(|l| l == "limits.focus_max"));
}

#[test]
fn test_stats_today_starts_empty() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["stats", "today"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["focus_minutes"], 0);
    assert_eq!(stats["completed_sessions"], 0);
}

#[test]
fn test_stats_reset_requires_confirmation() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["stats", "reset"]);
    assert_eq!(code, 1);
    let (code, stdout, _) = run_cli(home.path(), &["stats", "reset", "--yes"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("removed 0"));
}

#[test]
fn test_set_duration_is_clamped_and_persisted() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["timer", "set-duration", "focus", "90"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("focus duration set to 60 min"));

    let (code, stdout, _) = run_cli(home.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let event: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(event["type"], "StateSnapshot");
    assert_eq!(event["remaining_secs"], 3600);
}

#[test]
fn test_interactive_run_prints_events() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli_with_input(
        home.path(),
        &["timer", "run"],
        "start\npause\nswitch break\nquit\n",
    );
    assert_eq!(code, 0);
    let types: Vec<String> = stdout
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter_map(|v| v["type"].as_str().map(str::to_string))
        .collect();
    assert_eq!(types, ["TimerStarted", "TimerPaused", "SessionSwitched"]);
}

#[test]
fn test_background_check_without_snapshot() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["background-check"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no background session"));
}
