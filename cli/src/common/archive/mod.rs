//! # Archivetar Archive Module (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! Everything needed to turn a finished batch into an archive file.
//!
//! - **`compression`**: picks a compressor binary for the requested mode,
//!   preferring multi-threaded variants.
//! - **`tar`**: streams the files named in a batch manifest into a tar archive,
//!   optionally through that compressor.
//!
//! ```rust
//! use crate::common::archive::{compression, tar};
//!
//! let compressor = compression::find_compressor(Compression::Bzip2, std::env::var_os("PATH").as_deref())?;
//! let archive = tar::archive_path(&out_dir, &prefix, batch.sequence, Compression::Bzip2);
//! tar::create_batch_archive(&batch.manifest_path, &archive, compressor.as_deref())?;
//! ```
//!

pub mod compression;
pub mod tar;
