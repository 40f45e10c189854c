//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::json;
use tempfile::TempDir;

pub const COOKIE_VALUE: &str = "MTcwMDAwMDAwMHxzZXNzaW9u";

/// Creates a temp GCD_HOME directory for test isolation.
pub fn temp_gcd_home() -> TempDir {
    TempDir::new().expect("create temp gcd home")
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Writes a live session cookie into `home`.
pub fn sign_in(home: &Path) {
    let cookie = json!({"name": "gcd_session", "value": COOKIE_VALUE, "path": "/"});
    fs::write(home.join("session.json"), cookie.to_string()).expect("write session");
}

/// `gcd` isolated in `home`, talking to `server_url`, never opening a browser.
pub fn gcd(home: &Path, server_url: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("gcd");
    cmd.env("GCD_HOME", home)
        .env("GCD_SERVER_URL", server_url)
        .env("GCD_NO_BROWSER", "1")
        .env_remove("GCD_LOG");
    cmd
}

pub fn three_courses() -> serde_json::Value {
    json!([
        {"id": "a", "name": "Math"},
        {"id": "b", "name": "Art", "section": "Period 2"},
        {"id": "c", "name": "CS"}
    ])
}
