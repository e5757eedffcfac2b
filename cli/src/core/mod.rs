//! # Archivetar Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Infrastructure shared by every command:
//! - `config`: layered TOML configuration loading and validation
//! - `error`: the `ArchivetarError` taxonomy and the crate `Result` alias
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{ArchivetarError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
