//! # Archivetar Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types shared by every stage of an archivetar run:
//! walking, batching, archiving and purging. Fatal conditions are modelled as
//! variants of `ArchivetarError`; everything else flows through `anyhow` with
//! added context.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `ArchivetarError`: A custom error enum using `thiserror` for specific error types
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! The variants cover:
//! - Configuration errors (missing tools, invalid settings)
//! - Missing input files (listing, purge list)
//! - Listing parse errors
//! - Filesystem errors
//! - External command failures
//!
//! ## Examples
//!
//! ```rust
//! // Distinguish a malformed listing from other failures
//! match result {
//!     Err(e) if e.downcast_ref::<ArchivetarError>().is_some_and(|ae| matches!(ae, ArchivetarError::Parse { .. })) => {
//!         eprintln!("Listing is malformed: {}", e);
//!     }
//!     other => other?,
//! }
//! ```
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for the archivetar application.
#[derive(Error, Debug)]
pub enum ArchivetarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No {capability} binary found in PATH (looked for: {candidates})")]
    ToolNotFound {
        capability: String,
        candidates: String,
    },

    #[error("Input '{}' does not exist or is not a regular file", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Parse error on line {line_number}: {reason}: {line:?}")]
    Parse {
        line_number: usize,
        line: String,
        reason: String,
    },

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("External command failed: {cmd}, Status: {status}, Output:\n{output}")]
    ExternalCommand {
        cmd: String,
        status: String,
        output: String,
    },
}

impl ArchivetarError {
    /// Builds a parse error for a listing line. The line number is filled in by
    /// the reader, which is the only place that knows it. Bytes that are not
    /// UTF-8 are shown as U+FFFD.
    pub fn parse(line: impl AsRef<[u8]>, reason: impl Into<String>) -> Self {
        let line = String::from_utf8_lossy(line.as_ref());
        ArchivetarError::Parse {
            line_number: 0,
            line: line.trim_end_matches(['\r', '\n']).to_string(),
            reason: reason.into(),
        }
    }

    /// Returns a copy of a parse error tagged with its 1-based line number.
    /// Other variants are returned unchanged.
    pub fn at_line(self, number: usize) -> Self {
        match self {
            ArchivetarError::Parse { line, reason, .. } => ArchivetarError::Parse {
                line_number: number,
                line,
                reason,
            },
            other => other,
        }
    }
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
