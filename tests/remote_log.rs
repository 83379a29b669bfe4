#![expect(clippy::panic_in_result_fn, reason = "test assertions")]
#![expect(clippy::unwrap_used, reason = "test assertions")]

//! Integration tests for `POST /remote-log`: single and batched ingestion,
//! and the silent-discard policy for unknown sources.

use reqwest::StatusCode;
use serde_json::json;

mod common;

fn log_dir(server: &test_util::TestServer) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("frame-gateway-test-logs-{}", server.frame_port()))
}

#[test]
fn single_log_entry_is_appended_to_its_source_file() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|_| Ok(()))? else {
        return Ok(());
    };
    let client = reqwest::blocking::Client::new();

    let response = client
        .post(common::rest_url(&server, "/remote-log"))
        .json(&json!({
            "source": "scanai",
            "level": "info",
            "message": "frame accepted",
            "timestamp": "2026-07-28T00:00:00Z",
        }))
        .send()?;
    assert_eq!(response.status(), StatusCode::OK);

    let content = std::fs::read_to_string(log_dir(&server).join("scanai.log"))?;
    assert!(content.contains("frame accepted"));
    Ok(())
}

#[test]
fn batched_log_entries_share_one_write() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|_| Ok(()))? else {
        return Ok(());
    };
    let client = reqwest::blocking::Client::new();

    let response = client
        .post(common::rest_url(&server, "/remote-log"))
        .json(&json!({
            "source": "posai",
            "logs": [
                {"level": "info", "message": "sale rung up", "timestamp": "2026-07-28T00:00:00Z"},
                {"level": "warn", "message": "low stock", "timestamp": "2026-07-28T00:00:01Z"},
            ],
        }))
        .send()?;
    assert_eq!(response.status(), StatusCode::OK);

    let content = std::fs::read_to_string(log_dir(&server).join("posai.log"))?;
    assert!(content.contains("sale rung up"));
    assert!(content.contains("low stock"));
    Ok(())
}

#[test]
fn unknown_source_is_accepted_and_silently_discarded() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|_| Ok(()))? else {
        return Ok(());
    };
    let client = reqwest::blocking::Client::new();

    let response = client
        .post(common::rest_url(&server, "/remote-log"))
        .json(&json!({
            "source": "unknown-source",
            "level": "info",
            "message": "should be dropped",
            "timestamp": "2026-07-28T00:00:00Z",
        }))
        .send()?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!log_dir(&server).join("unknown-source.log").exists());
    Ok(())
}
