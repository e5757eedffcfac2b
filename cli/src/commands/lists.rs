//! # Archivetar Lists Handler
//!
//! File: cli/src/commands/lists.rs
//!
//! ## Overview
//!
//! Implements `archivetar lists`: split an existing walker listing into batch
//! manifest/index pairs without archiving anything. Each pair is printed as soon
//! as its batch closes, one per line:
//!
//! ```text
//! /work/archivetar-1.index.txt /work/archivetar-1.tartmp.txt
//! ```
//!
//! ## Usage
//!
//! ```bash
//! archivetar lists walk.txt --prefix project --size 500GB
//! ```
//!
use super::options::BatchArgs;
use crate::common::fs::io::ensure_dir_exists;
use crate::common::listing::BatchBuilder;
use crate::core::{config, error::Result};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// # Lists Arguments (`ListsArgs`)
#[derive(Parser, Debug)]
#[command(
    about = "Split a dwalk text listing into size-bounded batch lists",
    long_about = "Reads a sorted `dwalk --text` listing and writes one manifest\n\
                  (<prefix>-<N>.tartmp.txt) and one index (<prefix>-<N>.index.txt)\n\
                  per batch. A batch closes once its files add up to --size."
)]
pub struct ListsArgs {
    /// Listing produced by `dwalk --text`.
    listing: PathBuf,

    #[command(flatten)]
    batch: BatchArgs,

    /// Directory for batch files (defaults to the current directory).
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,
}

/// # Handle Lists Command (`handle_lists`)
///
/// Resolves prefix and size, then drains the batch builder, printing each
/// `index manifest` pair to stdout.
pub fn handle_lists(args: ListsArgs) -> Result<()> {
    info!("Handling lists command for {:?}", args.listing);
    let cfg = config::load_config().context("Failed to load archivetar configuration")?;
    let (prefix, min_batch_bytes) = args.batch.resolve(&cfg)?;

    let builder = match &args.output_dir {
        Some(dir) => {
            ensure_dir_exists(dir)?;
            BatchBuilder::with_output_dir(&args.listing, &prefix, min_batch_bytes, dir)?
        }
        None => BatchBuilder::new(&args.listing, &prefix, min_batch_bytes)?,
    };

    let mut batches = 0;
    for batch in builder {
        let batch = batch?;
        println!(
            "{} {}",
            batch.index_path.display(),
            batch.manifest_path.display()
        );
        batches += 1;
    }
    info!("Wrote {} batch lists", batches);
    Ok(())
}
