//! # Archivetar Create Handler
//!
//! File: cli/src/commands/create.rs
//!
//! ## Overview
//!
//! Implements `archivetar create`, the full archival pipeline:
//!
//! 1. Resolve settings and, unless `--dryrun`, locate the compressor. A missing
//!    compressor or walker aborts here, before anything is written.
//! 2. Produce a listing: walk the source directory with `dwalk` into
//!    `<prefix>.cache`, convert it to text in `<prefix>.txt`, or take an existing
//!    listing from `--listing`.
//! 3. Batch the listing. Each batch is archived to `<prefix>-<N>.tar[.gz|.bz2]`
//!    as soon as its lists are closed. With `--dryrun` only the lists are written
//!    and each batch's expected size is reported.
//! 4. Keep the walker cache as `<prefix>.purge.cache` for `archivetar purge` when
//!    `--save-purge-list` is given; otherwise remove it.
//!
//! All files are written to the current directory.
//!
//! ## Usage
//!
//! ```bash
//! # Walk, batch at 500 GB, compress with pigz/gzip, keep a purge list
//! archivetar create /scratch/project --size 500GB -z --save-purge-list
//!
//! # Preview batches from an existing listing
//! archivetar create --listing walk.txt --dryrun
//! ```
//!
use super::options::{BatchArgs, MpiArgs};
use crate::common::archive::compression::{find_compressor, Compression};
use crate::common::archive::tar::{archive_path, create_batch_archive};
use crate::common::listing::BatchBuilder;
use crate::core::{config, error::Result};
use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// # Create Arguments (`CreateArgs`)
#[derive(Parser, Debug)]
#[command(
    about = "Walk a directory, split it into batches and tar each batch",
    long_about = "Walks DIR with mpiFileUtils dwalk (or reads --listing), groups files into\n\
                  batches of at least --size bytes and writes one tar archive per batch,\n\
                  optionally compressed with a parallel compressor."
)]
pub struct CreateArgs {
    /// Directory to archive.
    #[arg(required_unless_present = "listing")]
    source: Option<PathBuf>,

    /// Use an existing `dwalk --text` listing instead of walking.
    #[arg(long, conflicts_with = "source")]
    listing: Option<PathBuf>,

    #[command(flatten)]
    batch: BatchArgs,

    #[command(flatten)]
    mpi: MpiArgs,

    /// Compress archives with pigz (or gzip).
    #[arg(short = 'z', long, conflicts_with = "bzip2")]
    gzip: bool,

    /// Compress archives with lbzip2 (or pbzip2, bzip2).
    #[arg(short = 'j', long)]
    bzip2: bool,

    /// Only write batch lists and report their expected sizes.
    #[arg(long)]
    dryrun: bool,

    /// Keep the walker cache as `<prefix>.purge.cache` for `archivetar purge`.
    #[arg(long)]
    save_purge_list: bool,
}

impl CreateArgs {
    fn compression(&self) -> Compression {
        if self.gzip {
            Compression::Gzip
        } else if self.bzip2 {
            Compression::Bzip2
        } else {
            Compression::None
        }
    }
}

/// Purge list name for `prefix`.
pub fn purge_list_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{}.purge.cache", prefix))
}

/// # Handle Create Command (`handle_create`)
///
/// See the module docs for the workflow.
pub fn handle_create(args: CreateArgs) -> Result<()> {
    info!(
        "Handling create command (source: {:?}, listing: {:?}, dryrun: {})",
        args.source, args.listing, args.dryrun
    );
    let cfg = config::load_config().context("Failed to load archivetar configuration")?;
    let (prefix, min_batch_bytes) = args.batch.resolve(&cfg)?;
    let compression = args.compression();
    let work_dir = std::env::current_dir().context("Failed to get current directory")?;

    let compressor = if args.dryrun {
        None
    } else {
        find_compressor(compression, std::env::var_os("PATH").as_deref())?
    };

    // (listing to batch, walker cache if we produced one)
    let (listing, cache) = match (&args.listing, &args.source) {
        (Some(listing), _) => (listing.clone(), None),
        (None, Some(source)) => {
            let mpi = args.mpi.resolve(&cfg)?;
            mpi.check_tool("dwalk")?;
            let cache = work_dir.join(format!("{}.cache", prefix));
            let listing = work_dir.join(format!("{}.txt", prefix));
            println!("Walking {} ...", source.display());
            mpi.walk_to_cache(source, &cache)?;
            mpi.cache_to_text(&cache, &listing)?;
            (listing, Some(cache))
        }
        (None, None) => anyhow::bail!("Either a source directory or --listing is required"),
    };

    let mut batches = 0u64;
    let mut total_bytes = 0u64;
    for batch in BatchBuilder::with_output_dir(&listing, &prefix, min_batch_bytes, &work_dir)? {
        let batch = batch?;
        batches += 1;
        total_bytes = total_bytes.saturating_add(batch.cumulative_bytes);

        if args.dryrun {
            println!(
                "{}: {} files, expected size {} bytes",
                batch.manifest_path.display(),
                batch.entries,
                batch.cumulative_bytes
            );
            continue;
        }

        let archive = archive_path(&work_dir, &prefix, batch.sequence, compression);
        create_batch_archive(&batch.manifest_path, &archive, compressor.as_deref())
            .with_context(|| format!("Failed to archive batch {}", batch.sequence))?;
        println!(
            "{}: {} files, {} bytes before compression",
            archive.display(),
            batch.entries,
            batch.cumulative_bytes
        );
    }
    println!("{} batches, {} bytes in total", batches, total_bytes);

    if let Some(cache) = cache {
        finish_walk(&cache, &listing, &work_dir, &prefix, args.save_purge_list)?;
    } else if args.save_purge_list {
        warn!("--save-purge-list needs a walker cache; nothing saved when --listing is used");
    }
    Ok(())
}

/// Keeps or removes the walker cache and drops the intermediate text listing,
/// whose lines now live in the index files.
fn finish_walk(cache: &Path, listing: &Path, dir: &Path, prefix: &str, save_purge_list: bool) -> Result<()> {
    if save_purge_list {
        let purge_list = purge_list_path(dir, prefix);
        fs::rename(cache, &purge_list)
            .with_context(|| format!("Failed to save purge list {:?}", purge_list))?;
        println!("Purge list saved to {}", purge_list.display());
    } else {
        fs::remove_file(cache).with_context(|| format!("Failed to remove {:?}", cache))?;
        debug!("Removed walker cache {:?}", cache);
    }
    fs::remove_file(listing).with_context(|| format!("Failed to remove {:?}", listing))?;
    Ok(())
}
