#![expect(clippy::panic_in_result_fn, reason = "test assertions")]
#![expect(clippy::unwrap_used, reason = "test assertions")]

//! Integration tests for the ACID checkout flow: `POST /transactions` and
//! `POST /transactions/{id}/cancel`.

use reqwest::StatusCode;
use serde_json::json;
use test_util::{DatabaseUrl, seed_product, seed_user, test_token, with_db};

mod common;

const AUTH_SECRET: &str = "change-me-in-production";

fn bearer(user_id: i32, username: &str) -> Result<String, test_util::AnyError> {
    Ok(format!("Bearer {}", test_token(AUTH_SECRET, user_id, username, "device-1")?))
}

fn checkout_body(code: Option<&str>, product_id: i64) -> serde_json::Value {
    json!({
        "header": {
            "code": code,
            "subtotal": "3.50",
            "discount_total": "0.00",
            "tax_total": "0.00",
            "total": "3.50",
            "paid_amount": "5.00",
            "payment_method": "CASH",
        },
        "items": [{
            "product_id": product_id,
            "item_name": "Coffee",
            "unit_price": "3.50",
            "quantity": 1,
        }],
    })
}

#[test]
fn checkout_commits_header_items_and_cancellation_reverses_it() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|db| {
        with_db(DatabaseUrl::new(db), |conn| {
            Box::pin(async move {
                let owner = seed_user(conn, "alice", "secret").await?;
                seed_product(conn, owner, 1, "Coffee", 3_500).await?;
                Ok(())
            })
        })
    })?
    else {
        return Ok(());
    };
    let client = reqwest::blocking::Client::new();
    let auth = bearer(1, "alice")?;

    let header: serde_json::Value = client
        .post(common::rest_url(&server, "/transactions"))
        .header("Authorization", &auth)
        .json(&checkout_body(Some("TRX-TEST-001"), 1))
        .send()?
        .json()?;
    assert_eq!(header["code"], "TRX-TEST-001");
    assert_eq!(header["total"], "3.50");
    assert_eq!(header["change_amount"], "1.50");
    let id = header["id"].as_i64().unwrap();

    let items: serde_json::Value = client
        .get(common::rest_url(&server, &format!("/transactions/{id}/items")))
        .header("Authorization", &auth)
        .send()?
        .json()?;
    assert_eq!(items.as_array().unwrap().len(), 1);

    let cancel = client
        .post(common::rest_url(&server, &format!("/transactions/{id}/cancel")))
        .header("Authorization", &auth)
        .send()?;
    assert_eq!(cancel.status(), StatusCode::OK);

    // Cancelling an already-cancelled header is rejected.
    let cancel_again = client
        .post(common::rest_url(&server, &format!("/transactions/{id}/cancel")))
        .header("Authorization", &auth)
        .send()?;
    assert_eq!(cancel_again.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[test]
fn duplicate_transaction_code_is_rejected() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|db| {
        with_db(DatabaseUrl::new(db), |conn| {
            Box::pin(async move {
                let owner = seed_user(conn, "alice", "secret").await?;
                seed_product(conn, owner, 1, "Coffee", 3_500).await?;
                Ok(())
            })
        })
    })?
    else {
        return Ok(());
    };
    let client = reqwest::blocking::Client::new();
    let auth = bearer(1, "alice")?;

    let first = client
        .post(common::rest_url(&server, "/transactions"))
        .header("Authorization", &auth)
        .json(&checkout_body(Some("TRX-DUP-001"), 1))
        .send()?;
    assert_eq!(first.status(), StatusCode::OK);

    let second = client
        .post(common::rest_url(&server, "/transactions"))
        .header("Authorization", &auth)
        .json(&checkout_body(Some("TRX-DUP-001"), 1))
        .send()?;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    Ok(())
}

#[test]
fn checkout_rejects_inconsistent_subtotal_and_non_positive_quantity() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|db| {
        with_db(DatabaseUrl::new(db), |conn| {
            Box::pin(async move {
                let owner = seed_user(conn, "alice", "secret").await?;
                seed_product(conn, owner, 1, "Coffee", 3_500).await?;
                Ok(())
            })
        })
    })?
    else {
        return Ok(());
    };
    let client = reqwest::blocking::Client::new();
    let auth = bearer(1, "alice")?;

    let mut mismatched_subtotal = checkout_body(Some("TRX-BAD-SUBTOTAL"), 1);
    mismatched_subtotal["header"]["subtotal"] = json!("10.00");
    let response = client
        .post(common::rest_url(&server, "/transactions"))
        .header("Authorization", &auth)
        .json(&mismatched_subtotal)
        .send()?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut mismatched_total = checkout_body(Some("TRX-BAD-TOTAL"), 1);
    mismatched_total["header"]["total"] = json!("99.00");
    let response = client
        .post(common::rest_url(&server, "/transactions"))
        .header("Authorization", &auth)
        .json(&mismatched_total)
        .send()?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut zero_quantity = checkout_body(Some("TRX-BAD-QTY"), 1);
    zero_quantity["items"][0]["quantity"] = json!(0);
    let response = client
        .post(common::rest_url(&server, "/transactions"))
        .header("Authorization", &auth)
        .json(&zero_quantity)
        .send()?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let listing: serde_json::Value = client
        .get(common::rest_url(&server, "/transactions"))
        .header("Authorization", &auth)
        .send()?
        .json()?;
    assert!(listing.as_array().unwrap().is_empty());
    Ok(())
}

#[test]
fn checkout_rejects_product_owned_by_another_user() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|db| {
        with_db(DatabaseUrl::new(db), |conn| {
            Box::pin(async move {
                let alice = seed_user(conn, "alice", "secret").await?;
                seed_user(conn, "mallory", "secret").await?;
                seed_product(conn, alice, 1, "Coffee", 3_500).await?;
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
        .post(common::rest_url(&server, "/transactions"))
        .header("Authorization", &mallory_auth)
        .json(&checkout_body(Some("TRX-CROSS-001"), 1))
        .send()?;
    assert!(matches!(
        response.status(),
        StatusCode::BAD_REQUEST | StatusCode::INTERNAL_SERVER_ERROR
    ));

    let listing: serde_json::Value = client
        .get(common::rest_url(&server, "/transactions"))
        .header("Authorization", &mallory_auth)
        .send()?
        .json()?;
    assert!(listing.as_array().unwrap().is_empty());
    Ok(())
}
