//! Integration tests for the `vreeda` CLI binary.
//!
//! Argument parsing, help output, completions and error exit codes run
//! without any network. Device commands run against a local mock API.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `vreeda` binary with env isolation.
///
/// Clears all `VREEDA_*` env vars and points config and data
/// directories at `home` so tests never touch the user's real setup.
fn vreeda_cmd(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vreeda");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("VREEDA_PROFILE")
        .env_remove("VREEDA_API_URL")
        .env_remove("VREEDA_ACCESS_TOKEN")
        .env_remove("VREEDA_OUTPUT")
        .env_remove("VREEDA_INSECURE")
        .env_remove("VREEDA_TIMEOUT")
        .env_remove("VREEDA_CLIENT_SECRET")
        .env_remove("VREEDA_SESSION_SECRET");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn device_listing() -> serde_json::Value {
    json!({
        "dev-2": {
            "tags": { "customDeviceName": "Hallway" },
            "connected": { "value": false },
            "states": { "on": { "value": false } }
        },
        "dev-1": {
            "tags": { "customDeviceName": "Desk Lamp" },
            "connected": { "value": true },
            "states": {
                "on": { "value": false },
                "h": { "value": 0.5 },
                "s": { "value": 0.2 },
                "v": { "value": 0.8 },
                "program": { "value": "color" }
            }
        }
    })
}

async fn mock_api() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vreeda/list-devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_listing()))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    vreeda_cmd(&home).arg("--help").assert().success().stdout(
        predicate::str::contains("devices")
            .and(predicate::str::contains("auth"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    vreeda_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vreeda"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    vreeda_cmd(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_channel_value_out_of_range_is_usage_error() {
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["devices", "set", "dev-1", "--hue", "1.5"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("outside [0, 1]"));
}

#[test]
fn test_set_requires_a_channel() {
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["devices", "set", "dev-1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_preset_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["devices", "preset", "dev-1", "disco"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Error exit codes ────────────────────────────────────────────────

#[test]
fn test_devices_without_config_reports_missing_api() {
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home).args(["devices", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("No device API configured"));
}

#[test]
fn test_unreachable_api_exits_with_connection_code() {
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["devices", "list", "--api-url", "http://127.0.0.1:1/api/vreeda/"])
        .args(["--timeout", "5"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

#[test]
fn test_whoami_without_session_is_auth_error() {
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home).args(["auth", "whoami"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Not signed in"));
}

#[test]
fn test_sign_in_without_profile_reports_profile() {
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["auth", "sign-in", "--code", "abc"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("Profile 'default' not found"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_points_at_toml() {
    let home = TempDir::new().unwrap();
    vreeda_cmd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_use_unknown_profile_fails() {
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["config", "use", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_show_masks_plaintext_secrets() {
    let home = TempDir::new().unwrap();
    let path = String::from_utf8(
        vreeda_cmd(&home)
            .args(["config", "path"])
            .output()
            .unwrap()
            .stdout,
    )
    .unwrap();
    let path = std::path::PathBuf::from(path.trim());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        r#"
default_profile = "home"

[profiles.home]
api_url = "http://localhost:3000/api/vreeda/"
client_secret = "hunter2"
"#,
    )
    .unwrap();

    vreeda_cmd(&home)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********").and(predicate::str::contains("hunter2").not()));
}

// ── Devices against a mock API ──────────────────────────────────────

#[tokio::test]
async fn test_devices_list_json_is_sorted_by_id() {
    let server = mock_api().await;
    let home = TempDir::new().unwrap();

    let output = vreeda_cmd(&home)
        .args(["devices", "list", "-o", "json"])
        .args(["--api-url", &format!("{}/api/vreeda/", server.uri())])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let devices: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = devices
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["dev-1", "dev-2"]);
    assert_eq!(devices[0]["connected"], json!(true));
}

#[tokio::test]
async fn test_devices_toggle_sends_power_only() {
    let server = mock_api().await;
    Mock::given(method("PATCH"))
        .and(path("/api/vreeda/patch-device"))
        .and(body_json(json!({
            "deviceId": "dev-1",
            "request": { "states": { "on": true } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    vreeda_cmd(&home)
        .args(["devices", "toggle", "desk lamp", "-o", "plain"])
        .args(["--api-url", &format!("{}/api/vreeda/", server.uri())])
        .assert()
        .success()
        .stdout(predicate::str::contains("dev-1"));
}

#[tokio::test]
async fn test_devices_toggle_names_one_device_twice_sends_once() {
    let server = mock_api().await;
    Mock::given(method("PATCH"))
        .and(path("/api/vreeda/patch-device"))
        .and(body_json(json!({
            "deviceId": "dev-1",
            "request": { "states": { "on": true } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["devices", "toggle", "dev-1", "Desk Lamp", "-o", "json"])
        .args(["--api-url", &format!("{}/api/vreeda/", server.uri())])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let devices: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(devices.as_array().unwrap().len(), 1);
    assert_eq!(devices[0]["states"]["on"], json!(true));
}

#[tokio::test]
async fn test_devices_preset_on_offline_device_sends_nothing() {
    let server = mock_api().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["devices", "preset", "dev-2", "alert"])
        .args(["--api-url", &format!("{}/api/vreeda/", server.uri())])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5), "{}", combined_output(&output));
}

#[tokio::test]
async fn test_devices_get_unknown_device_is_not_found() {
    let server = mock_api().await;
    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["devices", "get", "garage"])
        .args(["--api-url", &format!("{}/api/vreeda/", server.uri())])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("garage"));
}

#[tokio::test]
async fn test_rejected_token_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vreeda/list-devices"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "expired" })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = vreeda_cmd(&home)
        .args(["devices", "list", "--access-token", "stale"])
        .args(["--api-url", &format!("{}/api/vreeda/", server.uri())])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

// ── Sign-in against a mock identity provider ───────────────────────

/// Unsigned `id_token` for `{"sub":"abc","name":"A","email":"a@x.com"}`.
const ID_TOKEN: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
    eyJzdWIiOiJhYmMiLCJuYW1lIjoiQSIsImVtYWlsIjoiYUB4LmNvbSJ9.c2lnbmF0dXJl";

#[tokio::test]
async fn test_sign_in_succeeds_when_context_store_cannot_open() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "refresh_token": "R1",
            "id_token": ID_TOKEN,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let data_dir = home.path().join("state");
    // A directory where the database file should be.
    std::fs::create_dir_all(data_dir.join("user_contexts.redb")).unwrap();

    let config_path = String::from_utf8(
        vreeda_cmd(&home)
            .args(["config", "path"])
            .output()
            .unwrap()
            .stdout,
    )
    .unwrap();
    let config_path = std::path::PathBuf::from(config_path.trim());
    std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    std::fs::write(
        &config_path,
        format!(
            r#"
default_profile = "home"

[profiles.home]
api_url = "http://localhost:3000/api/vreeda/"
tenant = "contoso"
client_id = "app-123"
token_url = "{}/token"
data_dir = '{}'
"#,
            server.uri(),
            data_dir.display()
        ),
    )
    .unwrap();

    let output = vreeda_cmd(&home)
        .env("VREEDA_CLIENT_SECRET", "client-secret")
        .env("VREEDA_SESSION_SECRET", "session-secret")
        .args(["auth", "sign-in", "--code", "the-code", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("abc"));
    assert!(data_dir.join("session.jwt").is_file());
}
