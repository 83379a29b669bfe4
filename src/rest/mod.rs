//! The authenticated REST surface: products, categories, transactions,
//! login, remote-log ingestion, and an unauthenticated health probe.

mod categories;
mod error;
mod extractors;
mod health;
mod login;
mod money;
mod products;
mod remote_log;
mod transactions;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ApiError;
pub use extractors::AuthUser;

use crate::{db::Pools, log_sink::LogSink};
use error::method_not_allowed;

/// Shared state handed to every REST handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Read/write database pools.
    pub pools: Pools,
    /// HMAC secret used to verify and issue bearer tokens.
    pub auth_secret: Arc<str>,
    /// Append-only remote-log sink.
    pub log_sink: Arc<LogSink>,
}

/// Assemble the REST router: CORS-permissive, traced, and wired to `state`.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health).fallback(method_not_allowed))
        .route("/login", post(login::login).fallback(method_not_allowed))
        .route(
            "/remote-log",
            post(remote_log::ingest).fallback(method_not_allowed),
        )
        .route(
            "/categories",
            get(categories::list)
                .post(categories::create)
                .fallback(method_not_allowed),
        )
        .route(
            "/categories/:id",
            get(categories::get_one)
                .put(categories::rename)
                .delete(categories::deactivate)
                .fallback(method_not_allowed),
        )
        .route(
            "/products",
            get(products::list).post(products::create).fallback(method_not_allowed),
        )
        .route(
            "/products/:id",
            get(products::get_one)
                .put(products::update)
                .delete(products::deactivate)
                .fallback(method_not_allowed),
        )
        .route(
            "/transactions",
            get(transactions::list)
                .post(transactions::checkout_handler)
                .fallback(method_not_allowed),
        )
        .route(
            "/transactions/:id",
            get(transactions::get_one).fallback(method_not_allowed),
        )
        .route(
            "/transactions/:id/items",
            get(transactions::items).fallback(method_not_allowed),
        )
        .route(
            "/transactions/:id/cancel",
            post(transactions::cancel_handler).fallback(method_not_allowed),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
