//! Build script for man page generation and gRPC stub compilation.
//!
//! The CLI definitions are imported from the `cli-defs` crate, which provides
//! stable types shared between build-time and runtime consumers. The
//! inference RPC surface is compiled from `proto/inference.proto` with
//! `tonic-build` so the pool client stays in sync with the contract.

use std::{env, fs, io, path::PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;
use cli_defs::Cli;

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=cli-defs");
    println!("cargo::rerun-if-changed=proto/inference.proto");

    tonic_build::compile_protos("proto/inference.proto")?;

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            // Cargo does not set OUT_DIR for `cargo check` or IDE analysis runs.
            return Ok(());
        }
    };
    let bin_name = env::var("CARGO_PKG_NAME").unwrap_or_else(|_| "frame-gateway".into());

    let cmd = Cli::command();
    let man = Man::new(cmd);

    let man_path = out_dir.join(format!("{bin_name}.1"));
    let mut file = fs::File::create(&man_path)?;
    man.render(&mut file)?;

    Ok(())
}
