//! # Listing Line Parser (`common::listing::parser`)
//!
//! File: cli/src/common/listing/parser.rs
//!
//! ## Overview
//!
//! Parses one line of `dwalk --text` output into a [`ListingRecord`]. The format is
//! columnar and fixed:
//!
//! ```text
//! -rw-r--r-- bennet support 578.000  B Oct 22 2019 09:35 /scratch/support/bennet/run.batch
//! <perms>    <owner> <group> <size> <unit> <date/time tokens...>  <absolute path>
//! ```
//!
//! Sizes are printed with SI units, so normalization uses powers of 1000. The
//! arithmetic is done on the decimal text itself so `"500 KB"` is exactly
//! 500000 bytes with no floating point rounding.
//!
//! Lines are matched as bytes. File names on POSIX filesystems need not be UTF-8
//! and the walker prints them unchanged, so the path is carried as raw bytes.
//!
use crate::core::error::{ArchivetarError, Result};
use regex::bytes::Regex;
use std::sync::OnceLock;

static LISTING_LINE: OnceLock<Regex> = OnceLock::new();

/// Maximum number of fraction digits taken into account. Anything finer is far
/// below one byte for every supported unit.
const MAX_FRACTION_DIGITS: usize = 18;

fn listing_line_regex() -> &'static Regex {
    LISTING_LINE.get_or_init(|| {
        Regex::new(
            r"(?-u)^\S+\s+\S+\s+\S+\s+(?P<size>\d+(?:\.\d+)?)\s+(?P<unit>\S+)\s+\S.*?\s(?P<path>/.*)$",
        )
        .expect("listing line pattern is valid")
    })
}

/// One file from the listing: its size in bytes and its absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub size_bytes: u64,
    /// Path bytes exactly as listed.
    pub path: Vec<u8>,
}

/// SI size units as printed by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
}

impl SizeUnit {
    /// Looks up a unit token. Matching is exact (`KB`, not `kb` or `KiB`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "B" => Some(SizeUnit::B),
            "KB" => Some(SizeUnit::KB),
            "MB" => Some(SizeUnit::MB),
            "GB" => Some(SizeUnit::GB),
            "TB" => Some(SizeUnit::TB),
            "PB" => Some(SizeUnit::PB),
            _ => None,
        }
    }

    /// Bytes per unit.
    pub fn multiplier(self) -> u64 {
        match self {
            SizeUnit::B => 1,
            SizeUnit::KB => 1_000,
            SizeUnit::MB => 1_000_000,
            SizeUnit::GB => 1_000_000_000,
            SizeUnit::TB => 1_000_000_000_000,
            SizeUnit::PB => 1_000_000_000_000_000,
        }
    }
}

/// Parses one listing line. A trailing line terminator is ignored.
///
/// # Errors
///
/// Returns `ArchivetarError::Parse` if the line does not have the listing shape,
/// the unit is not one of B/KB/MB/GB/TB/PB, or the size overflows 64 bits. The
/// error's line number is 0; the reader tags it with the real one.
pub fn parse_line(line: impl AsRef<[u8]>) -> Result<ListingRecord> {
    let line = line.as_ref();
    let caps = listing_line_regex()
        .captures(trim_line_end(line))
        .ok_or_else(|| ArchivetarError::parse(line, "line does not match listing format"))?;

    let unit_token = &caps["unit"];
    let unit = std::str::from_utf8(unit_token)
        .ok()
        .and_then(SizeUnit::from_token)
        .ok_or_else(|| {
            ArchivetarError::parse(
                line,
                format!("'{}' is not a known SI unit", String::from_utf8_lossy(unit_token)),
            )
        })?;
    // The size group only matches ASCII digits and a dot.
    let size_bytes = std::str::from_utf8(&caps["size"])
        .ok()
        .and_then(|count| normalize_size(count, unit))
        .ok_or_else(|| ArchivetarError::parse(line, "size does not fit in 64 bits"))?;

    Ok(ListingRecord {
        size_bytes,
        path: caps["path"].to_vec(),
    })
}

fn trim_line_end(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    line
}

/// Converts a decimal count (`"578.000"`, `"2"`) in `unit` to bytes.
///
/// Sub-byte remainders are truncated. Returns `None` if the text is not a plain
/// decimal number or the result overflows `u64`.
pub fn normalize_size(count: &str, unit: SizeUnit) -> Option<u64> {
    let (whole, fraction) = match count.split_once('.') {
        Some((w, f)) => (w, f),
        None => (count, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let multiplier = u128::from(unit.multiplier());
    let whole: u128 = whole.parse().ok()?;
    let mut bytes = whole.checked_mul(multiplier)?;

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let numerator: u128 = fraction.parse().ok()?;
        let denominator = 10u128.pow(fraction.len() as u32);
        bytes = bytes.checked_add(numerator * multiplier / denominator)?;
    }

    u64::try_from(bytes).ok()
}

/// Parses a human size such as `100GB`, `100 GB`, `1.5TB` or a bare byte count.
/// Used for the `--size` option and the `min_batch_size` config key.
pub fn parse_human_size(text: &str) -> Result<u64> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (count, unit_token) = text.split_at(split);
    let unit_token = unit_token.trim();
    let unit = if unit_token.is_empty() {
        SizeUnit::B
    } else {
        SizeUnit::from_token(&unit_token.to_ascii_uppercase()).ok_or_else(|| {
            ArchivetarError::Config(format!(
                "Invalid size '{}': '{}' is not one of B, KB, MB, GB, TB, PB",
                text, unit_token
            ))
        })?
    };
    normalize_size(count, unit).ok_or_else(|| {
        ArchivetarError::Config(format!("Invalid size '{}': not a decimal number", text)).into()
    })
}
