//! # mpiFileUtils Invocation (`common::mpi`)
//!
//! File: cli/src/common/mpi.rs
//!
//! ## Overview
//!
//! Walking and removing very large trees is done by the MPI-parallel tools from
//! mpiFileUtils, launched through `mpirun`:
//!
//! - `dwalk` produces the sorted listing the batch builder consumes.
//! - `drm` removes the files named in a purge list.
//!
//! This module only builds and runs those command lines. The tools' own
//! parallelism is opaque to archivetar.
//!
//! ```rust
//! let mpi = MpiFileUtils::new(cfg.mpi.mpifileutils.into(), cfg.mpi.mpirun.into(), cfg.mpi.np);
//! mpi.check_tool("dwalk")?;
//! mpi.walk_to_cache(Path::new("/scratch/project"), Path::new("archivetar.cache"))?;
//! mpi.cache_to_text(Path::new("archivetar.cache"), Path::new("archivetar.txt"))?;
//! ```
//!
use crate::common::archive::compression::find_in_path;
use crate::common::process;
use crate::core::error::{ArchivetarError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Seconds between progress messages printed by the MPI tools.
const PROGRESS_INTERVAL: &str = "10";

/// Location of the mpiFileUtils install and how to launch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpiFileUtils {
    /// Install prefix; tools live in `<install>/bin`.
    pub install: PathBuf,
    /// `mpirun` binary, either a path or a name looked up in `PATH`.
    pub mpirun: PathBuf,
    /// Number of MPI ranks.
    pub np: u32,
}

impl MpiFileUtils {
    pub fn new(install: PathBuf, mpirun: PathBuf, np: u32) -> Self {
        MpiFileUtils { install, mpirun, np }
    }

    /// Path of an mpiFileUtils tool.
    pub fn tool_path(&self, tool: &str) -> PathBuf {
        self.install.join("bin").join(tool)
    }

    /// Verifies that `mpirun` and `tool` can be found, so a broken setup fails
    /// before any output is produced.
    ///
    /// # Errors
    ///
    /// `ArchivetarError::ToolNotFound` naming the missing piece.
    pub fn check_tool(&self, tool: &str) -> Result<()> {
        let mpirun_found = if self.mpirun.components().count() > 1 {
            self.mpirun.is_file()
        } else {
            find_in_path(&self.mpirun.to_string_lossy(), std::env::var_os("PATH").as_deref()).is_some()
        };
        if !mpirun_found {
            return Err(ArchivetarError::ToolNotFound {
                capability: "MPI launcher".into(),
                candidates: self.mpirun.display().to_string(),
            }
            .into());
        }
        let tool_path = self.tool_path(tool);
        if !tool_path.is_file() {
            return Err(ArchivetarError::ToolNotFound {
                capability: tool.into(),
                candidates: tool_path.display().to_string(),
            }
            .into());
        }
        debug!("Found {} at {:?}", tool, tool_path);
        Ok(())
    }

    /// `mpirun -np <np> <install>/bin/<tool>`, ready for tool arguments.
    pub fn command(&self, tool: &str) -> Command {
        let mut command = Command::new(&self.mpirun);
        command
            .arg("-np")
            .arg(self.np.to_string())
            .arg(self.tool_path(tool));
        command
    }

    /// Walks `source` and writes a name-sorted mpiFileUtils cache to `cache`.
    pub fn walk_command(&self, source: &Path, cache: &Path) -> Command {
        let mut command = self.command("dwalk");
        command
            .args(["--sort", "name", "--progress", PROGRESS_INTERVAL, "--output"])
            .arg(cache)
            .arg(source);
        command
    }

    /// Converts `cache` into the text listing format consumed by the batch builder.
    pub fn text_command(&self, cache: &Path, listing: &Path) -> Command {
        let mut command = self.command("dwalk");
        command
            .args(["--sort", "name", "--input"])
            .arg(cache)
            .args(["--text", "--output"])
            .arg(listing);
        command
    }

    /// Removes every file in `purge_list`; with `dryrun` only reports.
    pub fn remove_command(&self, purge_list: &Path, dryrun: bool) -> Command {
        let mut command = self.command("drm");
        command
            .args(["--progress", PROGRESS_INTERVAL, "--input"])
            .arg(purge_list);
        if dryrun {
            command.arg("--dryrun");
        }
        command
    }

    pub fn walk_to_cache(&self, source: &Path, cache: &Path) -> Result<()> {
        process::run_command(&mut self.walk_command(source, cache))
    }

    pub fn cache_to_text(&self, cache: &Path, listing: &Path) -> Result<()> {
        process::run_command(&mut self.text_command(cache, listing))
    }

    pub fn remove(&self, purge_list: &Path, dryrun: bool) -> Result<()> {
        process::run_command(&mut self.remove_command(purge_list, dryrun))
    }
}
