//! Server orchestration: CLI parsing, administrative commands, and the
//! daemon runtime that ties the storage layer, inference pool, and the
//! three listening surfaces together.

pub mod admin;
pub mod cli;
mod frame_tcp;
mod frame_udp;
mod runtime;
mod session_map;

use anyhow::Result;
use clap::Parser;

pub use cli::{AppConfig, Cli, Commands, CreateUserArgs};
pub use runtime::run_daemon;

/// Parse CLI arguments and execute the requested command or daemon.
///
/// # Errors
///
/// Returns any error emitted while parsing configuration or running the
/// requested command or daemon.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli).await
}

/// Execute the server logic using an already parsed [`Cli`].
///
/// # Errors
///
/// Propagates any failure reported by [`admin::run_command`] or
/// [`run_daemon`].
pub async fn run_with_cli(cli: Cli) -> Result<()> {
    let Cli { config, command } = cli;
    if let Some(command) = command {
        admin::run_command(command, &config).await
    } else {
        run_daemon(config).await
    }
}
