//! Shared CLI type definitions for the gateway's build and runtime.
//!
//! This crate provides CLI argument and configuration types used by both the
//! `build.rs` script (for man page generation) and the runtime binary.
//! Extracting these types into a separate crate avoids brittle `#[path = ...]`
//! includes and keeps build-time and runtime dependencies cleanly separated.

// FIXME: File-wide suppressions are unavoidable here. Clap and OrthoConfig derive macros
// inject generated code throughout the module, and there is no mechanism to narrow
// the scope without restructuring the crate.
#![expect(
    non_snake_case,
    reason = "Clap/OrthoConfig derive macros generate helper modules with uppercase names"
)]
#![expect(
    missing_docs,
    reason = "OrthoConfig and Clap derive macros generate items that cannot be documented"
)]

use clap::{Args, Parser, Subcommand};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Argon2 default parameters
//
// These constants duplicate `argon2::Params::DEFAULT_*` values so that
// build-time consumers (man page generation) can use this crate without
// adding `argon2` as a build-dependency.
//
// Values as of argon2 0.5.x:
//   DEFAULT_M_COST = 19_456
//   DEFAULT_T_COST = 2
//   DEFAULT_P_COST = 1
// ────────────────────────────────────────────────────────────────────────────

/// Default Argon2 memory cost (matches `argon2::Params::DEFAULT_M_COST`).
pub const DEFAULT_ARGON2_M_COST: u32 = 19_456;
/// Default Argon2 time cost (matches `argon2::Params::DEFAULT_T_COST`).
pub const DEFAULT_ARGON2_T_COST: u32 = 2;
/// Default Argon2 parallelism cost (matches `argon2::Params::DEFAULT_P_COST`).
pub const DEFAULT_ARGON2_P_COST: u32 = 1;

/// Arguments for the `create-user` administrative subcommand.
#[derive(Parser, OrthoConfig, Deserialize, Serialize, Default, Debug, Clone)]
#[ortho_config(prefix = "MXDGW_")]
pub struct CreateUserArgs {
    /// Username for the new account.
    pub username: Option<String>,
    /// Password for the new account.
    pub password: Option<String>,
    /// Subscription tier to grant (defaults to "free").
    pub tier: Option<String>,
}

/// CLI subcommands exposed by the gateway binary.
#[derive(Subcommand, Deserialize, Serialize, Debug, Clone)]
pub enum Commands {
    /// Create a new user account.
    #[command(name = "create-user")]
    CreateUser(CreateUserArgs),
    /// Apply pending database migrations and exit.
    #[command(name = "migrate")]
    Migrate,
}

/// Runtime configuration shared by the daemon and the admin subcommands.
///
/// The default bind addresses listen on all interfaces, which is convenient
/// for local development; production deployments should bind to a specific
/// interface and sit behind a reverse proxy or load balancer.
#[derive(Args, OrthoConfig, Serialize, Deserialize, Default, Debug, Clone)]
#[ortho_config(prefix = "MXDGW_")]
pub struct AppConfig {
    /// Bind address for the connection-oriented binary frame transport.
    #[ortho_config(default = "0.0.0.0:7000".to_owned())]
    #[arg(long)]
    pub bind_frame: String,
    /// Bind address for the UDP chunked frame transport.
    #[ortho_config(default = "0.0.0.0:7001".to_owned())]
    #[arg(long)]
    pub bind_udp: String,
    /// Bind address for the REST surface.
    #[ortho_config(default = "0.0.0.0:8080".to_owned())]
    #[arg(long)]
    pub bind_rest: String,
    /// Database connection string or path.
    #[ortho_config(default = "gateway.db".to_owned())]
    #[arg(long)]
    pub database: String,
    /// HMAC signing secret for bearer tokens.
    #[ortho_config(default = "change-me-in-production".to_owned())]
    #[arg(long)]
    pub auth_secret: String,
    /// Idle timeout (seconds) for connection-oriented clients.
    #[ortho_config(default = 30u64)]
    #[arg(long)]
    pub idle_timeout_secs: u64,
    /// Staleness horizon (seconds) for incomplete UDP reassemblies.
    #[ortho_config(default = 3u64)]
    #[arg(long)]
    pub udp_chunk_staleness_secs: u64,
    /// Sweep interval (seconds) for the UDP reassembly garbage collector.
    #[ortho_config(default = 2u64)]
    #[arg(long)]
    pub udp_sweep_interval_secs: u64,
    /// Hostname of the downstream inference service.
    #[ortho_config(default = "127.0.0.1".to_owned())]
    #[arg(long)]
    pub inference_host: String,
    /// Port of the downstream inference service.
    #[ortho_config(default = 50051u16)]
    #[arg(long)]
    pub inference_port: u16,
    /// Number of pooled inference RPC clients.
    #[ortho_config(default = 3usize)]
    #[arg(long)]
    pub inference_pool_size: usize,
    /// Directory for the append-only remote-log sink files.
    #[ortho_config(default = "logs".to_owned())]
    #[arg(long)]
    pub log_dir: String,
    /// Argon2 memory cost parameter.
    #[ortho_config(default = DEFAULT_ARGON2_M_COST)]
    #[arg(long)]
    pub argon2_m_cost: u32,
    /// Argon2 time cost parameter.
    #[ortho_config(default = DEFAULT_ARGON2_T_COST)]
    #[arg(long)]
    pub argon2_t_cost: u32,
    /// Argon2 parallelism cost parameter.
    #[ortho_config(default = DEFAULT_ARGON2_P_COST)]
    #[arg(long)]
    pub argon2_p_cost: u32,
}

/// Top-level CLI entry point consumed by the binary.
#[derive(Parser, Serialize)]
pub struct Cli {
    /// CLI configuration overrides (merged with files and defaults at runtime).
    #[command(flatten)]
    pub config: AppConfigCli,
    /// Optional administrative subcommand.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
