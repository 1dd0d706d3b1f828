//! ntsm - NTSM asset container tool
//!
//! # Commands
//!
//! - `ntsm migrate` - Convert a tree of .obj/.glb meshes into .ntsm containers
//! - `ntsm inspect` - Print the header, sections, emitters and textures of a file
//! - `ntsm extract` - Write the GLB and texture blobs of a file back out
//!
//! # Usage
//!
//! ```bash
//! # Convert everything under ./uploads, asking for confirmation first
//! ntsm migrate --src ./uploads --dst ./uploads-ntsm
//!
//! # Same, with emitters and textures from a manifest, no prompt
//! ntsm migrate --src ./uploads --dst ./out --manifest ntsm.toml --yes
//!
//! # Look inside a container
//! ntsm inspect out/weapons/sword.ntsm
//! ```
//!
//! Log output goes to stderr and respects `RUST_LOG`; `--verbose` raises the
//! default level to debug.

mod convert;
mod discover;
mod extract;
mod glb;
mod inspect;
mod manifest;
mod migrate;
mod obj;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// ntsm - NTSM asset container tool
#[derive(Parser)]
#[command(name = "ntsm")]
#[command(about = "Migrate, inspect and extract NTSM asset containers")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert .obj/.glb meshes into .ntsm containers
    Migrate(migrate::MigrateArgs),

    /// Print the contents of an .ntsm file
    Inspect(inspect::InspectArgs),

    /// Write the GLB and texture blobs of an .ntsm file to a directory
    Extract(extract::ExtractArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Migrate(args) => migrate::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Extract(args) => extract::execute(args),
    }
}
