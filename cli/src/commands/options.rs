//! # Shared Command Options
//!
//! File: cli/src/commands/options.rs
//!
//! ## Overview
//!
//! Argument groups flattened into several subcommands. Each group resolves its
//! flags against the loaded [`Config`]: a flag (or its `AT_*` environment
//! variable) wins, otherwise the configured value is used.
//!
use crate::common::listing::parser::parse_human_size;
use crate::common::mpi::MpiFileUtils;
use crate::core::config::{validate_prefix, Config};
use crate::core::error::{ArchivetarError, Result};
use anyhow::anyhow;
use clap::Args;
use std::path::PathBuf;

/// Batch naming and sizing flags.
#[derive(Args, Debug, Default)]
pub struct BatchArgs {
    /// Prefix for batch files (`<prefix>-<N>.tartmp.txt`, `<prefix>-<N>.index.txt`).
    #[arg(long, short = 'p')]
    pub prefix: Option<String>,

    /// Minimum cumulative size of a batch, e.g. `100GB`, `1.5TB` or a byte count.
    #[arg(long, short = 's')]
    pub size: Option<String>,
}

impl BatchArgs {
    /// Returns the effective `(prefix, min_batch_bytes)`.
    pub fn resolve(&self, cfg: &Config) -> Result<(String, u64)> {
        let prefix = self
            .prefix
            .clone()
            .unwrap_or_else(|| cfg.batch.prefix.clone());
        validate_prefix(&prefix)?;

        let min_batch_bytes = match &self.size {
            Some(size) => parse_human_size(size)?,
            None => cfg.min_batch_bytes()?,
        };
        if min_batch_bytes == 0 {
            return Err(anyhow!(ArchivetarError::Config(
                "--size must be greater than zero".to_string()
            )));
        }
        Ok((prefix, min_batch_bytes))
    }
}

/// Location of mpiFileUtils and `mpirun`.
#[derive(Args, Debug, Default)]
pub struct MpiArgs {
    /// mpiFileUtils install prefix (tools are expected in `<prefix>/bin`).
    #[arg(long, env = "AT_MPIFILEUTILS")]
    pub mpifileutils: Option<String>,

    /// `mpirun` binary.
    #[arg(long, env = "AT_MPIRUN")]
    pub mpirun: Option<String>,

    /// Number of MPI ranks.
    #[arg(long, env = "AT_NP")]
    pub np: Option<u32>,
}

impl MpiArgs {
    pub fn resolve(&self, cfg: &Config) -> Result<MpiFileUtils> {
        let install = self.mpifileutils.as_deref().unwrap_or(&cfg.mpi.mpifileutils);
        let mpirun = self.mpirun.as_deref().unwrap_or(&cfg.mpi.mpirun);
        let np = self.np.unwrap_or(cfg.mpi.np);
        if np == 0 {
            return Err(anyhow!(ArchivetarError::Config(
                "--np must be at least 1".to_string()
            )));
        }
        Ok(MpiFileUtils::new(
            PathBuf::from(shellexpand::tilde(install).into_owned()),
            PathBuf::from(shellexpand::tilde(mpirun).into_owned()),
            np,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_args_fall_back_to_config() {
        let (prefix, bytes) = BatchArgs::default().resolve(&Config::default()).unwrap();
        assert_eq!(prefix, "archivetar");
        assert_eq!(bytes, 100_000_000_000);
    }

    #[test]
    fn test_batch_args_override_config() {
        let args = BatchArgs {
            prefix: Some("proj".into()),
            size: Some("5 GB".into()),
        };
        assert_eq!(
            args.resolve(&Config::default()).unwrap(),
            ("proj".to_string(), 5_000_000_000)
        );
    }

    #[test]
    fn test_batch_args_reject_zero_and_bad_prefix() {
        let zero = BatchArgs {
            size: Some("0".into()),
            ..Default::default()
        };
        assert!(zero.resolve(&Config::default()).is_err());

        let slash = BatchArgs {
            prefix: Some("a/b".into()),
            ..Default::default()
        };
        assert!(slash.resolve(&Config::default()).is_err());
    }

    #[test]
    fn test_mpi_args_resolution() {
        let args = MpiArgs {
            mpirun: Some("/opt/openmpi/bin/mpirun".into()),
            np: Some(32),
            ..Default::default()
        };
        let mut cfg = Config::default();
        cfg.mpi.mpifileutils = "/opt/mfu".into();
        let mpi = args.resolve(&cfg).unwrap();
        assert_eq!(mpi.install, PathBuf::from("/opt/mfu"));
        assert_eq!(mpi.mpirun, PathBuf::from("/opt/openmpi/bin/mpirun"));
        assert_eq!(mpi.np, 32);

        let zero = MpiArgs {
            np: Some(0),
            ..Default::default()
        };
        assert!(zero.resolve(&cfg).is_err());
    }
}
