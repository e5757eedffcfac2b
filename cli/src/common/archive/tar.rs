//! # Batch Archive Creation (`common::archive::tar`)
//!
//! File: cli/src/common/archive/tar.rs
//!
//! ## Overview
//!
//! Writes one tar archive per batch from the batch's manifest file (one absolute
//! path per line, as raw bytes).
//!
//! ## Architecture
//!
//! The archive structure is built with the `tar` crate. Compression is delegated
//! to an external program found by `compression::find_compressor`: the tar stream
//! is written into the compressor's stdin (`<compressor> -c`) and the
//! compressor's stdout is redirected into the archive file. Without a compressor
//! the tar stream goes straight to the file.
//!
//! Member names are the manifest paths with the leading `/` removed, which is
//! what GNU tar stores for absolute paths, so archives extract relative to the
//! directory they are unpacked in.
//!
//! ## Usage
//!
//! ```rust
//! let archive = archive_path(Path::new("."), "archivetar", 1, Compression::Gzip);
//! create_batch_archive(&batch.manifest_path, &archive, Some(Path::new("/usr/bin/pigz")))?;
//! ```
//!
use super::compression::Compression;
use crate::common::fs::io::path_from_bytes;
use crate::common::process;
use crate::core::error::{ArchivetarError, Result};
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Archive path for batch `sequence`, e.g. `archivetar-3.tar.gz`.
pub fn archive_path(dir: &Path, prefix: &str, sequence: u64, compression: Compression) -> PathBuf {
    dir.join(format!("{}-{}.{}", prefix, sequence, compression.extension()))
}

/// Creates `archive` from the paths listed in `manifest`.
///
/// ## Arguments
///
/// * `manifest` - File with one absolute path per line.
/// * `archive` - Output path. Overwritten if it exists.
/// * `compressor` - External compressor binary, or `None` for a plain tar.
///
/// ## Returns
///
/// The number of members written.
///
/// ## Errors
///
/// - `ArchivetarError::FileSystem` if a listed path no longer exists.
/// - `ArchivetarError::ExternalCommand` if the compressor exits non-zero.
/// - I/O errors reading the manifest or writing the archive.
pub fn create_batch_archive(manifest: &Path, archive: &Path, compressor: Option<&Path>) -> Result<u64> {
    let output = File::create(archive)
        .with_context(|| format!("Failed to create archive {:?}", archive))?;

    let members = match compressor {
        None => {
            let (file, members) = write_tar(manifest, output)?;
            file.sync_all()
                .with_context(|| format!("Failed to sync archive {:?}", archive))?;
            members
        }
        Some(compressor) => {
            let mut command = Command::new(compressor);
            command
                .arg("-c")
                .stdin(Stdio::piped())
                .stdout(Stdio::from(output))
                .stderr(Stdio::piped());
            let cmd = process::describe(&command);
            debug!("Compressing {:?} through '{}'", archive, cmd);
            let mut child = command
                .spawn()
                .map_err(|e| process::spawn_error(&command, e))?;
            let stdin = child
                .stdin
                .take()
                .context("Compressor stdin was not captured")?;
            let stderr = process::drain_stderr(&mut child);
            // Dropping stdin before the wait lets the compressor see end of input.
            let written = write_tar(manifest, stdin).map(|(_stdin, members)| members);
            process::wait_checked(child, stderr, &cmd)?;
            written?
        }
    };

    info!("Wrote {:?} ({} files)", archive, members);
    Ok(members)
}

/// Streams the members listed in `manifest` as a tar into `writer`. Returns the
/// writer once the archive trailer is written, with the member count.
fn write_tar<W: Write>(manifest: &Path, writer: W) -> Result<(W, u64)> {
    let reader = BufReader::new(
        File::open(manifest).with_context(|| format!("Failed to open manifest {:?}", manifest))?,
    );
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);
    let mut members = 0;

    for line in reader.split(b'\n') {
        let line = line.with_context(|| format!("Failed to read manifest {:?}", manifest))?;
        if line.is_empty() {
            continue;
        }
        let source = path_from_bytes(&line);
        let source = source.as_path();
        if source.symlink_metadata().is_err() {
            return Err(ArchivetarError::FileSystem(format!(
                "Listed file {:?} no longer exists",
                source
            ))
            .into());
        }
        let name = member_name(source);
        builder
            .append_path_with_name(source, &name)
            .with_context(|| format!("Failed to add {:?} to archive", source))?;
        members += 1;
    }

    let writer = builder
        .into_inner()
        .context("Failed to finalize tar archive structure")?;
    Ok((writer, members))
}

/// Tar member name for an absolute path: the same path without the root.
fn member_name(path: &Path) -> PathBuf {
    path.strip_prefix("/").unwrap_or(path).to_path_buf()
}
