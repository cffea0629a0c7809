//! End-to-end tests driving the compiled harness binary.
//!
//! Each test builds a scratch workspace laid out like the player repository
//! (fixture matrix, pre-seeded download cache, stub player binary under
//! `target/`) and runs the CLI from inside it with `--skip-build`. Assets are
//! always pre-seeded, so any attempt to reach the fixture URLs would fail
//! the run.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

const MATRIX: &str = "slain-player/fixtures/fixture_matrix.json";
const DOWNLOADS: &str = "slain-player/fixtures/downloads";

fn cli(workspace: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_headless_playback"));
    command.current_dir(workspace);
    command
}

fn workspace(matrix: Value, seeded: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let matrix_path = dir.path().join(MATRIX);
    fs::create_dir_all(matrix_path.parent().unwrap()).unwrap();
    fs::write(&matrix_path, matrix.to_string()).unwrap();

    let downloads = dir.path().join(DOWNLOADS);
    fs::create_dir_all(&downloads).unwrap();
    for file in seeded {
        fs::write(downloads.join(file), b"media").unwrap();
    }
    dir
}

fn install_player(workspace: &Path, profile: &str, body: &str) -> PathBuf {
    let dir = workspace.join("target").join(profile);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("slain");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn two_suite_matrix() -> Value {
    serde_json::json!({
        "fixtures": [
            { "id": "b", "file": "b.mp4", "url": "http://x/b.mp4", "suite": "full" },
            {
                "id": "a",
                "file": "a.mp4",
                "url": "http://x/a.mp4",
                "codec": "h264",
                "container": "mp4",
                "frames": 30,
                "suite": "smoke"
            }
        ]
    })
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout UTF-8")
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).expect("stderr UTF-8")
}

#[test]
fn smoke_suite_runs_only_smoke_fixtures() {
    let ws = workspace(two_suite_matrix(), &["a.mp4"]);
    install_player(ws.path(), "debug", "echo \"decoding $3 for $5 frames\"\nexit 0");

    let output = cli(ws.path())
        .args(["--suite", "smoke", "--skip-build"])
        .output()
        .expect("failed to run headless_playback");
    assert!(
        output.status.success(),
        "harness exited with {:?}: {}",
        output.status.code(),
        stderr(&output)
    );
    assert!(stdout(&output).contains("completed successfully"));

    let report = fs::read_to_string(ws.path().join("artifacts/headless-report.md"))
        .expect("report written");
    let rows: Vec<&str> = report
        .lines()
        .filter(|line| line.starts_with("| ") && !line.starts_with("| Fixture"))
        .filter(|line| !line.starts_with("| ---"))
        .collect();
    assert_eq!(rows, vec!["| a | h264 | mp4 | 30 | pass |"]);
    assert!(report.contains("- Suite: smoke"));
    assert!(report.contains("- a: artifacts/headless-logs/a.log"));

    let log = fs::read_to_string(ws.path().join("artifacts/headless-logs/a.log")).unwrap();
    assert!(log.starts_with("fixture: a\ncodec: h264\ncontainer: mp4\n"));
    assert!(log.contains("frames: 30"));
    assert!(log.contains("exit_code: 0"));
    assert!(log.contains("for 30 frames"));
    assert!(!ws.path().join(DOWNLOADS).join("b.mp4").exists());
}

#[test]
fn full_suite_runs_every_fixture_and_failure_exits_one() {
    let ws = workspace(two_suite_matrix(), &["a.mp4", "b.mp4"]);
    install_player(
        ws.path(),
        "release",
        "case \"$3\" in\n  *b.mp4) echo boom 1>&2; exit 3 ;;\nesac\nexit 0",
    );

    let output = cli(ws.path())
        .args([
            "--suite",
            "full",
            "--skip-build",
            "--release",
            "--log-dir",
            "out/logs",
            "--report",
            "out/report.md",
            "--summary-json",
            "out/summary.json",
        ])
        .output()
        .expect("failed to run headless_playback");
    assert_eq!(output.status.code(), Some(1));

    let console = stdout(&output);
    assert!(console.contains("Headless playback failures detected:"));
    assert!(console.contains("- b (exit code 3): out/logs/b.log"));

    let log = fs::read_to_string(ws.path().join("out/logs/b.log")).unwrap();
    assert!(log.contains("exit_code: 3"));
    let (_, captured) = log.split_once("--- output ---\n").expect("output section");
    assert!(captured.contains("boom"));

    let summary: Value =
        serde_json::from_str(&fs::read_to_string(ws.path().join("out/summary.json")).unwrap())
            .expect("valid JSON summary");
    assert_eq!(summary["results"][0]["id"], "b");
    assert_eq!(summary["results"][0]["result"], "fail");
    assert_eq!(summary["results"][0]["exit_code"], 3);
    assert_eq!(summary["results"][1]["id"], "a");
    assert_eq!(summary["results"][1]["result"], "pass");
    assert_eq!(summary["results"].as_array().map(Vec::len), Some(2));
    assert!(!console.contains("- a ("));
}

#[test]
fn empty_selection_fails_without_report() {
    let matrix = serde_json::json!({
        "fixtures": [ { "id": "b", "file": "b.mp4", "url": "http://x/b.mp4", "suite": "full" } ]
    });
    let ws = workspace(matrix, &[]);

    let output = cli(ws.path())
        .args(["--suite", "smoke"])
        .output()
        .expect("failed to run headless_playback");
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("No fixtures selected for suite 'smoke'"),
        "expected selection error, got {}",
        stderr(&output)
    );
    assert!(stderr(&output).contains(
        "headless_playback error: headless playback run: CatalogError (code 2006): \
         No fixtures selected for suite 'smoke'."
    ));
    assert!(!ws.path().join("artifacts").exists());
}

#[test]
fn invalid_definition_names_fixture() {
    let matrix = serde_json::json!({
        "fixtures": [ { "id": "no-url", "file": "c.mkv", "suite": "smoke" } ]
    });
    let ws = workspace(matrix, &[]);

    let output = cli(ws.path())
        .arg("--skip-build")
        .output()
        .expect("failed to run headless_playback");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Fixture no-url is invalid"));
    assert!(!ws.path().join("artifacts/headless-report.md").exists());
}

#[test]
fn config_file_overrides_defaults() {
    let ws = workspace(two_suite_matrix(), &[]);
    let cache = ws.path().join("cache");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("a.mp4"), b"media").unwrap();
    install_player(&ws.path().join("build-out"), "debug", "exit 0");
    fs::write(
        ws.path().join("harness.json"),
        serde_json::json!({
            "downloads_dir": "cache",
            "skip_build": true,
            "build": { "target_dir": "build-out/target" }
        })
        .to_string(),
    )
    .unwrap();

    let output = cli(ws.path())
        .args(["--config", "harness.json"])
        .output()
        .expect("failed to run headless_playback");
    assert!(
        output.status.success(),
        "harness exited with {:?}: {}",
        output.status.code(),
        stderr(&output)
    );
}
