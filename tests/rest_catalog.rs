#![expect(clippy::panic_in_result_fn, reason = "test assertions")]
#![expect(clippy::unwrap_used, reason = "test assertions")]

//! Integration tests for the `/categories` and `/products` REST resources,
//! including cross-user ownership scoping.

use reqwest::StatusCode;
use serde_json::json;
use test_util::{DatabaseUrl, seed_category, seed_user, test_token, with_db};

mod common;

const AUTH_SECRET: &str = "change-me-in-production";

fn bearer(user_id: i32, username: &str) -> Result<String, test_util::AnyError> {
    Ok(format!("Bearer {}", test_token(AUTH_SECRET, user_id, username, "device-1")?))
}

#[test]
fn product_crud_round_trips() -> Result<(), test_util::AnyError> {
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
    let auth = bearer(1, "alice")?;

    let created: serde_json::Value = client
        .post(common::rest_url(&server, "/products"))
        .header("Authorization", &auth)
        .json(&json!({"name": "Coffee", "price": "3.50"}))
        .send()?
        .json()?;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["price"], "3.50");

    let fetched: serde_json::Value = client
        .get(common::rest_url(&server, &format!("/products/{id}")))
        .header("Authorization", &auth)
        .send()?
        .json()?;
    assert_eq!(fetched["name"], "Coffee");

    let update = client
        .put(common::rest_url(&server, &format!("/products/{id}")))
        .header("Authorization", &auth)
        .json(&json!({"name": "Coffee", "price": "4.00"}))
        .send()?;
    assert_eq!(update.status(), StatusCode::OK);

    let delete = client
        .delete(common::rest_url(&server, &format!("/products/{id}")))
        .header("Authorization", &auth)
        .send()?;
    assert_eq!(delete.status(), StatusCode::OK);
    Ok(())
}

#[test]
fn cross_user_access_is_rejected_as_not_found() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|db| {
        with_db(DatabaseUrl::new(db), |conn| {
            Box::pin(async move {
                let alice = seed_user(conn, "alice", "secret").await?;
                seed_user(conn, "mallory", "secret").await?;
                seed_category(conn, alice, "Beverages").await?;
                Ok(())
            })
        })
    })?
    else {
        return Ok(());
    };
    let client = reqwest::blocking::Client::new();
    let alice_auth = bearer(1, "alice")?;
    let mallory_auth = bearer(2, "mallory")?;

    let created: serde_json::Value = client
        .post(common::rest_url(&server, "/products"))
        .header("Authorization", &alice_auth)
        .json(&json!({"name": "Coffee", "price": "3.50", "category_id": 2}))
        .send()?
        .json()?;
    let product_id = created["id"].as_i64().unwrap();

    let as_mallory = client
        .get(common::rest_url(&server, &format!("/products/{product_id}")))
        .header("Authorization", &mallory_auth)
        .send()?;
    assert_eq!(as_mallory.status(), StatusCode::NOT_FOUND);

    let delete_as_mallory = client
        .delete(common::rest_url(&server, &format!("/products/{product_id}")))
        .header("Authorization", &mallory_auth)
        .send()?;
    assert_eq!(delete_as_mallory.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[test]
fn product_rejects_empty_name_and_negative_price() -> Result<(), test_util::AnyError> {
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
    let auth = bearer(1, "alice")?;

    let empty_name = client
        .post(common::rest_url(&server, "/products"))
        .header("Authorization", &auth)
        .json(&json!({"name": "", "price": "3.50"}))
        .send()?;
    assert_eq!(empty_name.status(), StatusCode::BAD_REQUEST);

    let negative_price = client
        .post(common::rest_url(&server, "/products"))
        .header("Authorization", &auth)
        .json(&json!({"name": "Coffee", "price": "-5.00"}))
        .send()?;
    assert_eq!(negative_price.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[test]
fn product_rejects_category_owned_by_another_user() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|db| {
        with_db(DatabaseUrl::new(db), |conn| {
            Box::pin(async move {
                let alice = seed_user(conn, "alice", "secret").await?;
                seed_user(conn, "mallory", "secret").await?;
                seed_category(conn, alice, "Beverages").await?;
                Ok(())
            })
        })
    })?
    else {
        return Ok(());
    };
    let client = reqwest::blocking::Client::new();
    let mallory_auth = bearer(2, "mallory")?;

    let response = client
        .post(common::rest_url(&server, "/products"))
        .header("Authorization", &mallory_auth)
        .json(&json!({"name": "Coffee", "price": "3.50", "category_id": 2}))
        .send()?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[test]
fn unsupported_method_returns_error_body() -> Result<(), test_util::AnyError> {
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
    let auth = bearer(1, "alice")?;

    let response = client
        .patch(common::rest_url(&server, "/products"))
        .header("Authorization", &auth)
        .send()?;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: serde_json::Value = response.json()?;
    assert_eq!(body["error"], "method not allowed");
    Ok(())
}

#[test]
fn category_requires_known_id_to_rename() -> Result<(), test_util::AnyError> {
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
    let auth = bearer(1, "alice")?;

    let response = client
        .put(common::rest_url(&server, "/categories/999"))
        .header("Authorization", &auth)
        .json(&json!({"name": "Nope"}))
        .send()?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
