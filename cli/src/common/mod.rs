//! # Archivetar Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared building blocks used by the command handlers in `commands::`.
//!
//! - **`listing`**: listing line parsing and size-bounded batch construction.
//! - **`archive`**: compressor discovery and per-batch tar creation.
//! - **`mpi`**: command lines for the mpiFileUtils walker (`dwalk`) and remover (`drm`).
//! - **`process`**: synchronous execution of external programs with error mapping.
//! - **`fs`**: filesystem helpers, including the empty-directory sweep used after a purge.
//!

/// Compressor discovery and batch archive creation.
pub mod archive;
/// Filesystem helpers.
pub mod fs;
/// Listing parsing and batching.
pub mod listing;
/// mpiFileUtils wrappers.
pub mod mpi;
/// External process execution.
pub mod process;
