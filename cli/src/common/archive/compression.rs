//! # Compressor Discovery (`common::archive::compression`)
//!
//! File: cli/src/common/archive/compression.rs
//!
//! ## Overview
//!
//! Archives are compressed by external programs so that multi-core compressors
//! (`pigz`, `lbzip2`, `pbzip2`) can be used when they are installed. This module
//! maps a [`Compression`] mode to the best binary available on a search path.
//!
//! The lookup is a pure function of the mode and the search path: nothing is
//! cached, and the driver calls it once before any batch work starts.
//!
//! ```rust
//! let gzip = find_compressor(Compression::Gzip, std::env::var_os("PATH").as_deref())?;
//! // Some("/usr/bin/pigz") when pigz is installed, else gzip.
//! ```
//!
use crate::core::error::{ArchivetarError, Result};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How each batch archive is compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Bzip2,
}

impl Compression {
    /// Binaries that can handle this mode, preferred first.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Compression::None => &[],
            Compression::Gzip => &["pigz", "gzip"],
            Compression::Bzip2 => &["lbzip2", "pbzip2", "bzip2"],
        }
    }

    /// Archive file extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Compression::None => "tar",
            Compression::Gzip => "tar.gz",
            Compression::Bzip2 => "tar.bz2",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
        };
        f.write_str(name)
    }
}

/// Finds the first candidate binary for `mode` in `search_path` (a `PATH`-style
/// list). Returns `Ok(None)` for [`Compression::None`].
///
/// # Errors
///
/// `ArchivetarError::ToolNotFound` if no candidate exists.
pub fn find_compressor(mode: Compression, search_path: Option<&OsStr>) -> Result<Option<PathBuf>> {
    let candidates = mode.candidates();
    if candidates.is_empty() {
        return Ok(None);
    }
    for name in candidates {
        if let Some(found) = find_in_path(name, search_path) {
            debug!("Using {:?} for {} compression", found, mode);
            return Ok(Some(found));
        }
    }
    Err(ArchivetarError::ToolNotFound {
        capability: mode.to_string(),
        candidates: candidates.join(", "),
    }
    .into())
}

/// Looks `name` up in a `PATH`-style list, returning the first executable file.
pub fn find_in_path(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
