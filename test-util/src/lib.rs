//! Utilities for integration tests.
//!
//! The `test-util` crate provides helpers to spin up temporary gateway
//! servers, seed their databases, speak the wire protocols, and, when the
//! `postgres` feature is enabled, manage embedded `PostgreSQL` instances. It
//! is used by integration tests in the main crate.

pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(feature = "postgres")]
pub mod postgres;

mod fixtures;
mod mock_inference;
mod protocol;
mod server;

pub use fixtures::{
    DatabaseUrl, scan_audit_outcomes, seed_category, seed_product, seed_user, setup_catalog_db, setup_checkout_db,
    with_db,
};
pub use mock_inference::{MockDetection, MockInferenceServer};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresTestDb, postgres_db};
pub use protocol::{build_envelope, recv_udp_response, send_frame, send_udp_envelope, test_token};
pub use server::{TestServer, ensure_server_binary_env};
