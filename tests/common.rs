#![allow(missing_docs, reason = "test helpers")]
#![allow(clippy::print_stderr, reason = "test diagnostics")]

use std::net::SocketAddr;

#[cfg(feature = "postgres")]
use test_util::postgres::PostgresUnavailable;
use test_util::{AnyError, TestServer, ensure_server_binary_env};

/// Build the base REST URL for `path` against a running `server`.
#[must_use]
pub fn rest_url(server: &TestServer, path: &str) -> String {
    format!("http://127.0.0.1:{}{path}", server.rest_port())
}

/// Start the server for a test or skip if prerequisites are unavailable.
///
/// Runs the provided setup callback against the database URL before launch,
/// returning a started `TestServer` on success or `None` when the
/// environment indicates the test should be skipped (e.g. embedded
/// `PostgreSQL` unavailable). The inference pool is left degraded.
///
/// # Errors
/// Returns any error produced by the setup callback or while launching the
/// server.
pub fn start_server_or_skip<F>(setup: F) -> Result<Option<TestServer>, AnyError>
where
    F: FnOnce(&str) -> Result<(), AnyError>,
{
    ensure_server_binary_env(env!("CARGO_BIN_EXE_frame-gateway"))?;
    match TestServer::start_with_setup("./Cargo.toml", |db| setup(db.as_str())) {
        Ok(s) => Ok(Some(s)),
        Err(e) => {
            #[cfg(feature = "postgres")]
            if e.downcast_ref::<PostgresUnavailable>().is_some() {
                eprintln!("skipping test: {e}");
                return Ok(None);
            }
            Err(e)
        }
    }
}

/// Like [`start_server_or_skip`], but wires the inference pool to
/// `inference_addr` with a single pooled client instead of leaving it
/// degraded. Start the mock backend before calling this.
///
/// # Errors
/// Returns any error produced by the setup callback or while launching the
/// server.
/// Like [`start_server_or_skip`], but with an empty database and additional
/// `MXDGW_*` environment overrides applied to the child process.
///
/// # Errors
/// Returns any error encountered while launching the server.
pub fn start_server_with_env_or_skip(extra_env: &[(String, String)]) -> Result<Option<TestServer>, AnyError> {
    ensure_server_binary_env(env!("CARGO_BIN_EXE_frame-gateway"))?;
    match TestServer::start_with_env("./Cargo.toml", extra_env) {
        Ok(s) => Ok(Some(s)),
        Err(e) => {
            #[cfg(feature = "postgres")]
            if e.downcast_ref::<PostgresUnavailable>().is_some() {
                eprintln!("skipping test: {e}");
                return Ok(None);
            }
            Err(e)
        }
    }
}

pub fn start_server_with_inference_or_skip<F>(
    setup: F,
    inference_addr: SocketAddr,
) -> Result<Option<TestServer>, AnyError>
where
    F: FnOnce(&str) -> Result<(), AnyError>,
{
    ensure_server_binary_env(env!("CARGO_BIN_EXE_frame-gateway"))?;
    match TestServer::start_with_inference("./Cargo.toml", |db| setup(db.as_str()), inference_addr) {
        Ok(s) => Ok(Some(s)),
        Err(e) => {
            #[cfg(feature = "postgres")]
            if e.downcast_ref::<PostgresUnavailable>().is_some() {
                eprintln!("skipping test: {e}");
                return Ok(None);
            }
            Err(e)
        }
    }
}
