//! Unauthenticated liveness probe.

use axum::Json;
use serde_json::{Value, json};

/// `GET /health` — always returns `200 {"status": "ok"}` once the listener is bound.
pub async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }
}
