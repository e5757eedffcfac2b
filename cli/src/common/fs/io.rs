//! # Archivetar Filesystem Operations
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! Small wrappers around `std::fs` used by the batching, archiving and purge
//! stages. They attach path context to every I/O failure and map "wrong kind of
//! path" conditions onto `ArchivetarError` variants so callers can tell them
//! apart.
//!
//! - **`ensure_dir_exists`**: `mkdir -p`, failing if the path is a file.
//! - **`ensure_regular_file`**: rejects missing paths and non-files with `InputNotFound`.
//! - **`read_file_to_string`**: `fs::read_to_string` with context.
//! - **`remove_empty_dirs`**: depth-first removal of empty directories below a root.
//! - **`path_from_bytes`**: a path from the raw bytes of a listing or manifest line.
//!
use crate::core::error::{ArchivetarError, Result};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Ensures that a directory exists at the specified path, creating parents as needed.
///
/// # Errors
///
/// Returns an `Err` if the path exists but is not a directory, or creation fails.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(ArchivetarError::FileSystem(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Checks that `path` exists and is a regular file (symlinks are followed).
///
/// # Errors
///
/// `ArchivetarError::InputNotFound` otherwise.
pub fn ensure_regular_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        debug!("Rejecting input {:?}: missing or not a regular file", path);
        Err(ArchivetarError::InputNotFound {
            path: path.to_path_buf(),
        }
        .into())
    }
}

/// Reads the entire content of a file into a string, with the path in the error.
pub fn read_file_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Builds a path from the raw bytes of a listing or manifest line.
#[cfg(unix)]
pub fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
pub fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Removes every empty directory below `root`, deepest first, so a directory that
/// only held empty directories is removed too. `root` itself is kept. Symlinks are
/// not followed.
///
/// Returns the number of directories removed.
pub fn remove_empty_dirs(root: &Path) -> Result<usize> {
    if !root.is_dir() {
        debug!("{:?} is not a directory, nothing to remove", root);
        return Ok(0);
    }

    let mut removed = 0;
    // contents_first yields children before their parent, so parents are checked
    // after their empty children are gone.
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", root))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let is_empty = fs::read_dir(path)
            .with_context(|| format!("Failed to read directory {:?}", path))?
            .next()
            .is_none();
        if is_empty {
            debug!("Removing empty {:?}", path);
            fs::remove_dir(path)
                .with_context(|| format!("Failed to remove directory {:?}", path))?;
            removed += 1;
        }
    }
    info!("Removed {} empty directories under {:?}", removed, root);
    Ok(removed)
}
