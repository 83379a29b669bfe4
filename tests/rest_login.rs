#![expect(clippy::panic_in_result_fn, reason = "test assertions")]
#![expect(clippy::unwrap_used, reason = "test assertions")]

//! Integration tests for `POST /login`, run against a real gateway subprocess.

use reqwest::StatusCode;
use serde_json::json;
use test_util::{DatabaseUrl, seed_user, with_db};

mod common;

#[test]
fn login_succeeds_with_correct_credentials() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|db| {
        with_db(DatabaseUrl::new(db), |conn| {
            Box::pin(async move {
                seed_user(conn, "alice", "secret").await?;
                Ok(())
            })
        })
    })?
    else {
        return Ok(());
    };

    let client = reqwest::blocking::Client::new();
    let response = client
        .post(common::rest_url(&server, "/login"))
        .json(&json!({"username": "alice", "password": "secret", "device_id": "device-1"}))
        .send()?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json()?;
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["username"], "alice");
    assert_eq!(body["subscription_tier"], "free");
    Ok(())
}

#[test]
fn login_rejects_wrong_password() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|db| {
        with_db(DatabaseUrl::new(db), |conn| {
            Box::pin(async move {
                seed_user(conn, "alice", "secret").await?;
                Ok(())
            })
        })
    })?
    else {
        return Ok(());
    };

    let client = reqwest::blocking::Client::new();
    let response = client
        .post(common::rest_url(&server, "/login"))
        .json(&json!({"username": "alice", "password": "wrong", "device_id": "device-1"}))
        .send()?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[test]
fn login_rejects_unknown_user() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|_| Ok(()))? else {
        return Ok(());
    };

    let client = reqwest::blocking::Client::new();
    let response = client
        .post(common::rest_url(&server, "/login"))
        .json(&json!({"username": "ghost", "password": "anything", "device_id": "device-1"}))
        .send()?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[test]
fn protected_route_without_bearer_token_is_rejected() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|_| Ok(()))? else {
        return Ok(());
    };

    let client = reqwest::blocking::Client::new();
    let response = client.get(common::rest_url(&server, "/products")).send()?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
