//! # Archivetar Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! One module per subcommand. Each defines a Clap arguments struct and a
//! `handle_*` function returning the crate `Result`; `main.rs` routes to them.
//!
//! - `lists`: split a listing into batch manifest/index files
//! - `create`: walk, batch and archive a directory
//! - `purge`: remove archived originals from a saved purge list
//!
//! `options` holds argument groups shared by several subcommands.
//!

/// `archivetar create`: walk, batch and archive.
pub mod create;
/// `archivetar lists`: batch lists only.
pub mod lists;
/// Argument groups shared between subcommands.
pub mod options;
/// `archivetar purge`: remove archived originals.
pub mod purge;
