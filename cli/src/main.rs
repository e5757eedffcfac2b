//! # Archivetar Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! Prepares large directory trees for tape/tar archival. The tree is walked with
//! mpiFileUtils, the resulting listing is split into batches of a minimum size,
//! and each batch becomes one tar archive. Once the archives are stored, the
//! originals can be purged.
//!
//! This file handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//!
//! ## Examples
//!
//! ```bash
//! # Batch lists only
//! archivetar lists walk.txt --size 200GB
//!
//! # Full pipeline with gzip compression, verbose logging
//! archivetar -v create /scratch/project -z --save-purge-list
//!
//! # Remove the archived originals
//! archivetar purge --purge-list archivetar.purge.cache
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Subcommand handlers (lists, create, purge)
mod common; // Listing, archive, process and filesystem utilities
mod core; // Configuration and errors

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "archivetar",
    about = "Prepare a directory for archival in size-bounded tar batches",
    long_about = "Walks a directory with mpiFileUtils, groups files into batches of at least\n\
                  --size bytes, writes one tar archive per batch, and later purges the originals.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase messages (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,
    /// Only print warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    Lists(commands::lists::ListsArgs),
    Create(commands::create::CreateArgs),
    Purge(commands::purge::PurgeArgs),
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose, cli.quiet)));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Lists(args) => commands::lists::handle_lists(args),
        Commands::Create(args) => commands::create::handle_create(args),
        Commands::Purge(args) => commands::purge::handle_purge(args),
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
