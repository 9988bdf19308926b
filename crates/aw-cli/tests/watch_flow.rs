//! End-to-end tests for the watch flow.
//!
//! Drives the `aw` binary: watch a JSONL feed, then inspect the recorded
//! sessions through `status` and `sessions`.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const WATCHED: &str = "861974078431821885";

fn aw_binary() -> String {
    env!("CARGO_BIN_EXE_aw").to_string()
}

/// Runs `aw` with an isolated home, config dir and database.
fn aw(temp: &Path, args: &[&str]) -> Output {
    Command::new(aw_binary())
        .env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join(".config"))
        .env("XDG_DATA_HOME", temp.join(".local/share"))
        .env("AW_DATABASE_PATH", temp.join("aw.db"))
        .env("AW_WATCHED_USER_ID", WATCHED)
        .env_remove("AW_TOKEN")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run aw")
}

fn presence_line(user: &str, old: Option<&str>, new: &str) -> String {
    let old = old.map_or_else(
        || "null".to_string(),
        |status| format!("{{\"visible_status\":\"{status}\"}}"),
    );
    format!(
        "{{\"type\":\"presence_update\",\"user_id\":\"{user}\",\"old_presence\":{old},\"presence\":{{\"visible_status\":\"{new}\"}}}}"
    )
}

fn write_feed(temp: &Path, lines: &[String]) -> std::path::PathBuf {
    let path = temp.join("events.jsonl");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

/// A full start/stop cycle is announced on stdout and persisted.
#[test]
fn test_watch_announces_and_records_transitions() {
    let temp = TempDir::new().unwrap();
    let feed = write_feed(
        temp.path(),
        &[
            "{\"type\":\"ready\"}".to_string(),
            presence_line(WATCHED, None, "online"),
            presence_line(WATCHED, Some("online"), "idle"),
            presence_line("1234", Some("online"), "offline"),
            presence_line(WATCHED, Some("idle"), "offline"),
        ],
    );

    let output = aw(temp.path(), &["watch", "--events", feed.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "aw watch should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec!["🟢  Amor is now running", "🔴  Amor stopped"]
    );

    let status = aw(temp.path(), &["status"]);
    assert!(status.status.success());
    let status = String::from_utf8(status.stdout).unwrap();
    assert!(status.contains("Sessions: 1"), "status output: {status}");
    assert!(status.contains(&format!("Watching: {WATCHED}")));
}

/// Sessions chain across separate watch runs against the same database.
#[test]
fn test_sessions_accumulate_across_runs() {
    let temp = TempDir::new().unwrap();
    let feed = write_feed(
        temp.path(),
        &[
            presence_line(WATCHED, Some("offline"), "dnd"),
            presence_line(WATCHED, Some("dnd"), "offline"),
        ],
    );

    for _ in 0..2 {
        let output = aw(temp.path(), &["watch", "--events", feed.to_str().unwrap()]);
        assert!(output.status.success());
    }

    let output = aw(temp.path(), &["sessions", "--json"]);
    assert!(output.status.success());
    let sessions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    // The second session carries the offline gap since the first one closed.
    assert!(sessions[0]["offline_time"].as_i64().unwrap() >= 0);
    assert!(sessions[0].get("leave").is_some());
    assert!(sessions[1].get("leave").is_some());
}

/// Malformed lines are skipped without aborting the feed.
#[test]
fn test_watch_skips_malformed_lines() {
    let temp = TempDir::new().unwrap();
    let feed = write_feed(
        temp.path(),
        &[
            "not json".to_string(),
            presence_line(WATCHED, None, "online"),
        ],
    );

    let output = aw(temp.path(), &["watch", "--events", feed.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "🟢  Amor is now running\n"
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("skipping malformed event"));
}

/// A missing feed file is a startup error.
#[test]
fn test_watch_fails_for_missing_feed() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing.jsonl");

    let output = aw(temp.path(), &["watch", "--events", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to open event feed"));
}
