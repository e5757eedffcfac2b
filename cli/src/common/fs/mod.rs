//! # Archivetar Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! Entry point for filesystem helpers. Everything currently lives in `io`:
//! directory creation, input file validation, and the empty-directory sweep that
//! follows a purge.
//!
//! ```rust
//! use crate::common::fs::io;
//!
//! io::ensure_regular_file(Path::new("archivetar.purge.cache"))?;
//! let removed = io::remove_empty_dirs(&std::env::current_dir()?)?;
//! ```
//!

/// Basic file I/O operations (`ensure_dir_exists`, `ensure_regular_file`, `remove_empty_dirs`).
pub mod io;
