//! # Listing Processing (`common::listing`)
//!
//! File: cli/src/common/listing/mod.rs
//!
//! ## Overview
//!
//! Turns the text listing written by the parallel walker into archive batches.
//!
//! - **`parser`**: parses one listing line into a size/path record, normalizing SI units.
//! - **`batcher`**: streams records into size-bounded manifest/index file pairs.
//!

/// Line parsing and size normalization.
pub mod parser;
/// Size-bounded batch construction.
pub mod batcher;

pub use batcher::BatchBuilder;
