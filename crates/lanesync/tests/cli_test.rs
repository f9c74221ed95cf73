//! Integration tests for the `lanesync` CLI binary.
//!
//! Argument parsing, help output, completions, and error handling run
//! without a printer; the lane listing and command paths run against a
//! wiremock printer host.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `lanesync` binary with env isolation.
///
/// Clears all `LANESYNC_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn lanesync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("lanesync");
    cmd.env("HOME", "/tmp/lanesync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/lanesync-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("LANESYNC_PROFILE")
        .env_remove("LANESYNC_PRINTER")
        .env_remove("LANESYNC_API_KEY")
        .env_remove("LANESYNC_OUTPUT")
        .env_remove("LANESYNC_INSECURE")
        .env_remove("LANESYNC_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn printer() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/printer/afc/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "status:": {
                    "AFC": {
                        "system": { "current_load": "lane1" },
                        "Turtle_1": {
                            "system": { "type": "Box_Turtle" },
                            "lane1": {
                                "lane": 1, "prep": true, "load": true, "tool_loaded": true,
                                "map": "T0", "material": "PLA", "weight": 812.6
                            },
                            "lane2": { "lane": 2, "prep": true, "load": false }
                        }
                    }
                }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/printer/objects/list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "objects": ["AFC"] } })),
        )
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = lanesync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    lanesync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("lanes")
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("lane")),
    );
}

#[test]
fn test_version_flag() {
    lanesync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lanesync"));
}

#[test]
fn test_completions_zsh() {
    lanesync_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_lanes_without_printer_is_usage_error() {
    let output = lanesync_cmd().arg("lanes").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("No printer configured"));
}

#[test]
fn test_invalid_printer_url() {
    lanesync_cmd()
        .args(["--printer", "not a url", "lanes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid URL"));
}

#[test]
fn test_unreachable_printer_is_connection_error() {
    let output = lanesync_cmd()
        .args(["--printer", "http://127.0.0.1:9", "--timeout", "2", "lanes"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[test]
fn test_move_accepts_negative_distance() {
    // Parsing succeeds; failure comes from the missing printer, not clap.
    let output = lanesync_cmd()
        .args(["lane", "move", "lane1", "-25"])
        .output()
        .unwrap();
    assert!(combined_output(&output).contains("No printer configured"));
}

#[test]
fn test_config_path_prints_location() {
    lanesync_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Against a printer ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_lanes_plain_lists_names() {
    let server = printer().await;
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        lanesync_cmd()
            .args(["--printer", &uri, "-o", "plain", "lanes"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "lane1\nlane2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lanes_json_includes_status() {
    let server = printer().await;
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        lanesync_cmd()
            .args(["--printer", &uri, "-o", "json-compact", "lanes"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    let lanes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(lanes[0]["status"], "tooled");
    assert_eq!(lanes[0]["weight"], 813);
    assert_eq!(lanes[1]["status"], "prep_not_load");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lane_load_sends_directive() {
    let server = printer().await;
    Mock::given(method("POST"))
        .and(path("/printer/gcode/script"))
        .and(body_json(json!({ "script": "CHANGE_TOOL LANE=lane2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        lanesync_cmd()
            .args(["--printer", &uri, "lane", "load", "lane2"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_lane_is_not_found() {
    let server = printer().await;
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        lanesync_cmd()
            .args(["--printer", &uri, "lane", "show", "lane9"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    assert_eq!(output.status.code(), Some(4));
}
