//! # Batch Builder (`common::listing::batcher`)
//!
//! File: cli/src/common/listing/batcher.rs
//!
//! ## Overview
//!
//! Splits a sorted listing into size-bounded batches. Each batch produces two
//! files in the output directory:
//!
//! - `<prefix>-<N>.tartmp.txt`: one absolute path per line, fed to the archiver.
//! - `<prefix>-<N>.index.txt`: the original listing lines, verbatim.
//!
//! Lines are handled as raw bytes end to end, so file names that are not valid
//! UTF-8 reach the manifest and index unchanged.
//!
//! A batch closes as soon as its running size reaches the threshold. Whatever is
//! left when the listing runs out becomes the final batch, even if it is small.
//!
//! ## Architecture
//!
//! `BatchBuilder` is an `Iterator<Item = Result<Batch>>`. It reads one line at a
//! time, so memory stays flat regardless of listing size, and it hands each batch
//! back to the caller the moment its files are closed. Only one batch's files are
//! ever open.
//!
//! Files for a batch are created when its first record arrives. The one exception
//! is an empty listing, which yields a single empty batch so callers always get at
//! least one pair.
//!
//! ## Usage
//!
//! ```rust
//! let builder = BatchBuilder::new(Path::new("walk.txt"), "archivetar", 100_000_000_000)?;
//! for batch in builder {
//!     let batch = batch?;
//!     println!("{} {}", batch.index_path.display(), batch.manifest_path.display());
//! }
//! ```
//!
use super::parser::parse_line;
use crate::common::fs::io::ensure_regular_file;
use crate::core::error::{ArchivetarError, Result};
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default filename prefix for batch files.
pub const DEFAULT_PREFIX: &str = "archivetar";

const MANIFEST_SUFFIX: &str = "tartmp.txt";
const INDEX_SUFFIX: &str = "index.txt";

/// A closed batch and the files that describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based position of the batch in the run.
    pub sequence: u64,
    pub manifest_path: PathBuf,
    pub index_path: PathBuf,
    /// Exact sum of the member sizes.
    pub cumulative_bytes: u64,
    pub entries: u64,
}

/// Manifest path for batch `sequence`.
pub fn manifest_path(dir: &Path, prefix: &str, sequence: u64) -> PathBuf {
    dir.join(format!("{}-{}.{}", prefix, sequence, MANIFEST_SUFFIX))
}

/// Index path for batch `sequence`.
pub fn index_path(dir: &Path, prefix: &str, sequence: u64) -> PathBuf {
    dir.join(format!("{}-{}.{}", prefix, sequence, INDEX_SUFFIX))
}

/// Writers for the batch currently being filled.
struct OpenBatch {
    sequence: u64,
    manifest_path: PathBuf,
    index_path: PathBuf,
    manifest: BufWriter<File>,
    index: BufWriter<File>,
    cumulative_bytes: u64,
    entries: u64,
}

impl OpenBatch {
    fn create(dir: &Path, prefix: &str, sequence: u64) -> Result<Self> {
        let manifest_path = manifest_path(dir, prefix, sequence);
        let index_path = index_path(dir, prefix, sequence);
        let manifest = File::create(&manifest_path)
            .with_context(|| format!("Failed to create manifest {:?}", manifest_path))?;
        let index = File::create(&index_path)
            .with_context(|| format!("Failed to create index {:?}", index_path))?;
        debug!("Opened batch {} ({:?})", sequence, manifest_path);
        Ok(OpenBatch {
            sequence,
            manifest_path,
            index_path,
            manifest: BufWriter::new(manifest),
            index: BufWriter::new(index),
            cumulative_bytes: 0,
            entries: 0,
        })
    }

    fn append(&mut self, raw_line: &[u8], path: &[u8], size_bytes: u64) -> Result<()> {
        self.index
            .write_all(raw_line)
            .with_context(|| format!("Failed to write index {:?}", self.index_path))?;
        if !raw_line.ends_with(b"\n") {
            self.index
                .write_all(b"\n")
                .with_context(|| format!("Failed to write index {:?}", self.index_path))?;
        }
        self.manifest
            .write_all(path)
            .and_then(|()| self.manifest.write_all(b"\n"))
            .with_context(|| format!("Failed to write manifest {:?}", self.manifest_path))?;
        self.cumulative_bytes = self.cumulative_bytes.saturating_add(size_bytes);
        self.entries += 1;
        Ok(())
    }

    /// Flushes and closes both files.
    fn close(self) -> Result<Batch> {
        let OpenBatch {
            sequence,
            manifest_path,
            index_path,
            manifest,
            index,
            cumulative_bytes,
            entries,
        } = self;
        for (writer, path) in [(manifest, &manifest_path), (index, &index_path)] {
            let file = writer
                .into_inner()
                .map_err(|e| e.into_error())
                .with_context(|| format!("Failed to flush {:?}", path))?;
            file.sync_all()
                .with_context(|| format!("Failed to sync {:?}", path))?;
        }
        Ok(Batch {
            sequence,
            manifest_path,
            index_path,
            cumulative_bytes,
            entries,
        })
    }
}

/// Lazily turns a listing into batches. See the module docs.
pub struct BatchBuilder {
    reader: Box<dyn BufRead>,
    prefix: String,
    min_batch_bytes: u64,
    output_dir: PathBuf,
    next_sequence: u64,
    line_number: usize,
    current: Option<OpenBatch>,
    emitted_any: bool,
    finished: bool,
}

impl BatchBuilder {
    /// Opens `listing` for batching into the current working directory.
    ///
    /// # Errors
    ///
    /// `ArchivetarError::InputNotFound` if `listing` is missing or not a regular
    /// file. No output file is created in that case.
    pub fn new(listing: &Path, prefix: &str, min_batch_bytes: u64) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::with_output_dir(listing, prefix, min_batch_bytes, &cwd)
    }

    /// Like [`BatchBuilder::new`], writing batch files into `output_dir`.
    pub fn with_output_dir(
        listing: &Path,
        prefix: &str,
        min_batch_bytes: u64,
        output_dir: &Path,
    ) -> Result<Self> {
        ensure_regular_file(listing)?;
        let file = File::open(listing)
            .with_context(|| format!("Failed to open listing {:?}", listing))?;
        info!(
            "Batching {:?} into {:?} (prefix '{}', minimum {} bytes)",
            listing, output_dir, prefix, min_batch_bytes
        );
        Ok(Self::from_reader(
            BufReader::new(file),
            prefix,
            min_batch_bytes,
            output_dir,
        ))
    }

    /// Batches lines from an already open reader.
    pub fn from_reader<R: BufRead + 'static>(
        reader: R,
        prefix: &str,
        min_batch_bytes: u64,
        output_dir: &Path,
    ) -> Self {
        BatchBuilder {
            reader: Box::new(reader),
            prefix: prefix.to_string(),
            min_batch_bytes,
            output_dir: output_dir.to_path_buf(),
            next_sequence: 1,
            line_number: 0,
            current: None,
            emitted_any: false,
            finished: false,
        }
    }

    fn open_next(&mut self) -> Result<OpenBatch> {
        let batch = OpenBatch::create(&self.output_dir, &self.prefix, self.next_sequence)?;
        self.next_sequence += 1;
        Ok(batch)
    }

    /// Pulls lines until a batch closes or the listing ends.
    fn advance(&mut self) -> Result<Option<Batch>> {
        let mut raw_line = Vec::new();
        loop {
            raw_line.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut raw_line)
                .with_context(|| format!("Failed to read listing after line {}", self.line_number))?;

            if read == 0 {
                self.finished = true;
                let last = match self.current.take() {
                    Some(open) => Some(open),
                    None if !self.emitted_any => Some(self.open_next()?),
                    None => None,
                };
                return match last {
                    Some(open) => {
                        let batch = open.close()?;
                        info!(
                            "Listing exhausted, final batch {} holds {} bytes in {} files",
                            batch.sequence, batch.cumulative_bytes, batch.entries
                        );
                        Ok(Some(batch))
                    }
                    None => Ok(None),
                };
            }

            self.line_number += 1;
            let record = parse_line(&raw_line).map_err(|e| match e.downcast::<ArchivetarError>() {
                Ok(ae) => anyhow::Error::new(ae.at_line(self.line_number)),
                Err(other) => other,
            })?;

            if self.current.is_none() {
                self.current = Some(self.open_next()?);
            }
            if let Some(open) = self.current.as_mut() {
                open.append(&raw_line, &record.path, record.size_bytes)?;
                if open.cumulative_bytes < self.min_batch_bytes {
                    continue;
                }
            }

            if let Some(open) = self.current.take() {
                let batch = open.close()?;
                info!(
                    "Minimum archive size {} reached, expected size: {}",
                    self.min_batch_bytes, batch.cumulative_bytes
                );
                return Ok(Some(batch));
            }
        }
    }
}

impl Iterator for BatchBuilder {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(batch)) => {
                self.emitted_any = true;
                Some(Ok(batch))
            }
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
