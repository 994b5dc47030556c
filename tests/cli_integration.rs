use assert_cmd::Command;
use predicates::prelude::*;

fn playauth_cmd(state_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("playauth").unwrap();
    cmd.env("PLAYAUTH_STATE_DIR", state_dir)
        .env("PLAYAUTH_SERVER", "http://127.0.0.1:9/")
        .env("PLAYAUTH_API_URL", "http://127.0.0.1:9/v1/")
        .env_remove("PLAYAUTH_LOG_LEVEL");
    cmd
}

#[test]
fn help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    playauth_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("player-state"));
}

#[test]
fn token_show_without_token() {
    let dir = tempfile::tempdir().unwrap();
    playauth_cmd(dir.path())
        .args(["token", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("state:         no token"));
}

#[test]
fn token_set_access_then_show() {
    let dir = tempfile::tempdir().unwrap();
    playauth_cmd(dir.path())
        .args(["token", "set-access", "manual-access"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Access token updated."));

    playauth_cmd(dir.path())
        .args(["token", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"access_token\": \"manual-access\""))
        .stdout(predicate::str::contains("\"state\": \"valid\""));
}

#[test]
fn token_set_refresh_writes_refresh_token() {
    let dir = tempfile::tempdir().unwrap();
    playauth_cmd(dir.path())
        .args(["token", "set-refresh", "manual-refresh"])
        .assert()
        .success();

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("token.json")).unwrap())
            .unwrap();
    assert_eq!(stored["refresh_token"], "manual-refresh");
    assert!(stored.get("access_token").map_or(true, |v| v.is_null()));
}

#[test]
fn auto_connect_flag_persists() {
    let dir = tempfile::tempdir().unwrap();
    playauth_cmd(dir.path())
        .args(["auto-connect", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto connect: true"));

    playauth_cmd(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto connecting..."));
}

#[test]
fn transfer_without_device_id() {
    let dir = tempfile::tempdir().unwrap();
    playauth_cmd(dir.path())
        .arg("transfer")
        .assert()
        .success()
        .stdout(predicate::str::contains("No Device ID: Try connect first"));
}

#[test]
fn me_without_token_points_at_authorize_url() {
    let dir = tempfile::tempdir().unwrap();
    playauth_cmd(dir.path())
        .arg("me")
        .assert()
        .success()
        .stdout(predicate::str::contains("Use newToken"))
        .stdout(predicate::str::contains("http://127.0.0.1:9/authorizeUrl"));
}

#[test]
fn login_without_browser_prints_url() {
    let dir = tempfile::tempdir().unwrap();
    playauth_cmd(dir.path())
        .args(["login", "--no-browser"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Authorize at http://127.0.0.1:9/authorizeUrl"));
}

#[test]
fn play_rejects_garbage_input() {
    let dir = tempfile::tempdir().unwrap();
    playauth_cmd(dir.path())
        .args(["play", "not-a-uri"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid_input"));
}
