//! Core library for the Frame Ingestion Gateway.
//!
//! This crate exposes the wire codec, the UDP reassembler, the frame
//! pipeline, the inference client pool, the REST surface, the auth core, the
//! storage layer, and the remote-log sink described in the gateway's design
//! documents. Only one database backend (either `sqlite` or `postgres`)
//! should be enabled at a time.

#![cfg_attr(
    test,
    expect(clippy::big_endian_bytes, reason = "network protocol uses big-endian")
)]
#![cfg_attr(test, expect(clippy::str_to_string, reason = "test code"))]
#![cfg_attr(test, expect(clippy::unwrap_used, reason = "test code can panic"))]
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "test code with known bounds")
)]
#![cfg_attr(test, expect(clippy::shadow_reuse, reason = "test code shadowing"))]
#![cfg_attr(
    test,
    expect(clippy::let_underscore_must_use, reason = "test cleanup code")
)]
#![cfg_attr(
    test,
    expect(clippy::unneeded_field_pattern, reason = "test pattern matching")
)]

cfg_if::cfg_if! {
    if #[cfg(all(feature = "sqlite", feature = "postgres", not(feature = "lint")))] {
        compile_error!("Choose either sqlite or postgres, not both");
    } else if #[cfg(feature = "sqlite")] {
        pub use diesel::sqlite::Sqlite as DbBackend;
    } else if #[cfg(feature = "postgres")] {
        pub use diesel::pg::Pg as DbBackend;
    } else {
        compile_error!("Either the 'sqlite' or 'postgres' feature must be enabled");
    }
}

pub mod auth;
pub mod db;
pub mod inference;
pub mod log_sink;
pub mod models;
pub mod pipeline;
pub mod rest;
pub mod schema;
pub mod server;
pub mod udp;
pub mod wire;
