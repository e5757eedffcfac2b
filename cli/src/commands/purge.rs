//! # Archivetar Purge Handler
//!
//! File: cli/src/commands/purge.rs
//!
//! ## Overview
//!
//! Implements `archivetar purge`, which deletes originals once their archives are
//! safely stored elsewhere. The purge list is the walker cache saved by
//! `archivetar create --save-purge-list`.
//!
//! ## Architecture
//!
//! 1. Check that the purge list exists and is a regular file.
//! 2. Run `drm --input <purge list>` through `mpirun` (`--dryrun` passes through
//!    and ends the command right after `drm` reports).
//! 3. Unless `--keep-empty-dirs`, remove directories under the current directory
//!    that are now empty.
//! 4. Unless `--save-purge-list`, delete the purge list.
//!
//! ## Usage
//!
//! ```bash
//! # See what would be removed
//! archivetar purge --purge-list archivetar.purge.cache --dryrun
//!
//! # Remove the files and any directories left empty
//! archivetar purge --purge-list archivetar.purge.cache
//! ```
//!
use super::options::MpiArgs;
use crate::common::fs::io::{ensure_regular_file, remove_empty_dirs};
use crate::core::{config, error::Result};
use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// # Purge Arguments (`PurgeArgs`)
#[derive(Parser, Debug)]
#[command(
    about = "Remove files listed in a purge list created by `archivetar create`",
    long_about = "Deletes the files named in a saved purge list using mpiFileUtils drm,\n\
                  then removes directories left empty under the current directory."
)]
pub struct PurgeArgs {
    /// Purge list written by `archivetar create --save-purge-list`.
    #[arg(long, required = true)]
    purge_list: PathBuf,

    /// Print what would be removed without removing anything.
    #[arg(long)]
    dryrun: bool,

    /// Don't remove the purge list when complete.
    #[arg(long)]
    save_purge_list: bool,

    /// Don't remove empty directories.
    #[arg(long)]
    keep_empty_dirs: bool,

    #[command(flatten)]
    mpi: MpiArgs,
}

/// # Handle Purge Command (`handle_purge`)
pub fn handle_purge(args: PurgeArgs) -> Result<()> {
    info!(
        "Handling purge command (list: {:?}, dryrun: {})",
        args.purge_list, args.dryrun
    );
    ensure_regular_file(&args.purge_list)?;

    let cfg = config::load_config().context("Failed to load archivetar configuration")?;
    let mpi = args.mpi.resolve(&cfg)?;
    mpi.check_tool("drm")?;
    mpi.remove(&args.purge_list, args.dryrun)?;

    if args.dryrun {
        debug!("Dryrun requested, stopping after drm");
        return Ok(());
    }

    if args.keep_empty_dirs {
        debug!("Skipping removal of empty directories");
    } else {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let removed = remove_empty_dirs(&cwd)?;
        println!("Removed {} empty directories", removed);
    }

    if args.save_purge_list {
        debug!("Keeping purge list {:?}", args.purge_list);
    } else {
        fs::remove_file(&args.purge_list)
            .with_context(|| format!("Failed to remove purge list {:?}", args.purge_list))?;
        debug!("Removed purge list {:?}", args.purge_list);
    }
    Ok(())
}
