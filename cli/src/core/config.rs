//! # Archivetar Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! Loads the settings that are stable across runs on a site: default batch prefix
//! and size, and where mpiFileUtils and `mpirun` live. Per-run choices are CLI
//! flags; flags and the `AT_*` environment variables override anything loaded here.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.archivetar.toml` in the current directory or an ancestor
//!    (the search stops at a directory containing `.git`)
//! 2. User-specific `<config dir>/archivetar/config.toml`
//! 3. Default values defined in the code
//!
//! Files are read into [`ConfigFile`] layers whose fields are all optional, so a
//! key is overridden exactly when a higher layer sets it, even to the default
//! value. After merging, paths are tilde-expanded and values are validated.
//!
//! ```toml
//! [batch]
//! prefix = "archivetar"
//! min_batch_size = "100GB"
//!
//! [mpi]
//! mpifileutils = "~/mpifileutils/install"
//! mpirun = "mpirun"
//! np = 4
//! ```
//!
use crate::common::fs::io::read_file_to_string;
use crate::common::listing::batcher::DEFAULT_PREFIX;
use crate::common::listing::parser::parse_human_size;
use crate::core::error::{ArchivetarError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The effective configuration after all layers are merged.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub batch: BatchConfig,
    pub mpi: MpiConfig,
}

/// Batch naming and sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Prefix for batch files (`<prefix>-<N>.tartmp.txt`, ...).
    pub prefix: String,
    /// Minimum cumulative size of a batch, e.g. `"100GB"`.
    pub min_batch_size: String,
}

/// Where the MPI tools live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpiConfig {
    /// mpiFileUtils install prefix (can use ~). Will be expanded.
    pub mpifileutils: String,
    /// `mpirun` path or name (can use ~). Will be expanded.
    pub mpirun: String,
    /// Number of MPI ranks.
    pub np: u32,
}

/// One configuration file as written on disk. Absent keys are `None`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub batch: BatchSection,
    #[serde(default)]
    pub mpi: MpiSection,
}

/// `[batch]` table of a configuration file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BatchSection {
    pub prefix: Option<String>,
    pub min_batch_size: Option<String>,
}

/// `[mpi]` table of a configuration file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MpiSection {
    pub mpifileutils: Option<String>,
    pub mpirun: Option<String>,
    pub np: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            prefix: default_prefix(),
            min_batch_size: default_min_batch_size(),
        }
    }
}

impl Default for MpiConfig {
    fn default() -> Self {
        MpiConfig {
            mpifileutils: default_mpifileutils(),
            mpirun: default_mpirun(),
            np: default_np(),
        }
    }
}

impl Config {
    /// Overrides every value `layer` sets.
    pub fn apply(&mut self, layer: ConfigFile) {
        let ConfigFile { batch, mpi } = layer;
        if let Some(prefix) = batch.prefix {
            self.batch.prefix = prefix;
        }
        if let Some(min_batch_size) = batch.min_batch_size {
            self.batch.min_batch_size = min_batch_size;
        }
        if let Some(mpifileutils) = mpi.mpifileutils {
            self.mpi.mpifileutils = mpifileutils;
        }
        if let Some(mpirun) = mpi.mpirun {
            self.mpi.mpirun = mpirun;
        }
        if let Some(np) = mpi.np {
            self.mpi.np = np;
        }
    }

    /// The configured minimum batch size in bytes.
    pub fn min_batch_bytes(&self) -> Result<u64> {
        parse_human_size(&self.batch.min_batch_size)
            .with_context(|| format!("Invalid [batch] min_batch_size '{}'", self.batch.min_batch_size))
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}
fn default_min_batch_size() -> String {
    "100GB".to_string()
}
fn default_mpifileutils() -> String {
    "~/mpifileutils/install".to_string()
}
fn default_mpirun() -> String {
    "mpirun".to_string()
}
fn default_np() -> u32 {
    4
}

const PROJECT_CONFIG_FILENAME: &str = ".archivetar.toml";

/// Loads, merges, expands and validates the configuration.
pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config, project_config);
    expand_config_paths(&mut merged_config);
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<ConfigFile>> {
    if let Some(proj_dirs) = ProjectDirs::from("org", "archivetar", "archivetar") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!("User configuration file not found at {}", config_path.display());
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<ConfigFile>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(path) = find_project_config_path(&current_dir) {
        info!("Loading project configuration from: {}", path.display());
        load_config_from_path(&path).map(Some)
    } else {
        debug!("No {} found in current directory or ancestors.", PROJECT_CONFIG_FILENAME);
        Ok(None)
    }
}

fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!("Found .git directory at {}, stopping project config search.", path.display());
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = read_file_to_string(path)?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Applies the user layer, then the project layer, over the built-in defaults.
fn merge_configs(user: Option<ConfigFile>, project: Option<ConfigFile>) -> Config {
    let mut config = Config::default();
    for layer in [user, project].into_iter().flatten() {
        config.apply(layer);
    }
    config
}

fn expand_config_paths(config: &mut Config) {
    config.mpi.mpifileutils = shellexpand::tilde(&config.mpi.mpifileutils).into_owned();
    config.mpi.mpirun = shellexpand::tilde(&config.mpi.mpirun).into_owned();
    debug!(
        "Expanded mpi paths: mpifileutils={}, mpirun={}",
        config.mpi.mpifileutils, config.mpi.mpirun
    );
}

/// Checks the values that would otherwise fail deep inside a run.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_prefix(&config.batch.prefix)?;
    let min_batch_bytes = config.min_batch_bytes()?;
    if min_batch_bytes == 0 {
        return Err(anyhow!(ArchivetarError::Config(
            "min_batch_size must be greater than zero".to_string()
        )));
    }
    if config.mpi.np == 0 {
        return Err(anyhow!(ArchivetarError::Config(
            "mpi.np must be at least 1".to_string()
        )));
    }
    Ok(())
}

/// A prefix becomes part of file names in the output directory.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(anyhow!(ArchivetarError::Config(
            "prefix must not be empty".to_string()
        )));
    }
    if prefix.contains('/') {
        return Err(anyhow!(ArchivetarError::Config(format!(
            "prefix '{}' must not contain '/'",
            prefix
        ))));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_content = r#"
            [batch]
            prefix = "project-x"
            min_batch_size = "2TB"

            [mpi]
            mpifileutils = "~/mfu"
        "#;

        let layer: ConfigFile = toml::from_str(toml_content).expect("Failed to parse TOML");
        assert_eq!(layer.mpi.np, None);
        let config = merge_configs(Some(layer), None);

        assert_eq!(config.batch.prefix, "project-x");
        assert_eq!(config.min_batch_bytes().unwrap(), 2_000_000_000_000);
        assert_eq!(config.mpi.mpifileutils, "~/mfu"); // Not yet expanded
        assert_eq!(config.mpi.mpirun, "mpirun"); // Default
        assert_eq!(config.mpi.np, 4); // Default
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let layer: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(layer, ConfigFile::default());
        let config = merge_configs(Some(layer), None);
        assert_eq!(config, Config::default());
        assert_eq!(config.min_batch_bytes().unwrap(), 100_000_000_000);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(toml::from_str::<ConfigFile>("[batch]\nsize = 1\n").is_err());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config::default();
        config.mpi.mpirun = "/usr/bin/mpirun".to_string();
        expand_config_paths(&mut config);

        let home_dir = dirs::home_dir().unwrap();
        assert_eq!(
            config.mpi.mpifileutils,
            home_dir.join("mpifileutils/install").to_string_lossy()
        );
        assert_eq!(config.mpi.mpirun, "/usr/bin/mpirun"); // Absolute path unchanged
    }

    #[test]
    fn test_merge_prefers_project_overrides() {
        let user: ConfigFile = toml::from_str("[batch]\nprefix = \"user-prefix\"\n[mpi]\nnp = 16\n").unwrap();
        let project: ConfigFile = toml::from_str("[batch]\nmin_batch_size = \"1TB\"\n").unwrap();

        let merged = merge_configs(Some(user), Some(project));
        assert_eq!(merged.batch.prefix, "user-prefix");
        assert_eq!(merged.batch.min_batch_size, "1TB");
        assert_eq!(merged.mpi.np, 16);
        assert_eq!(merged.mpi.mpirun, "mpirun");
    }

    #[test]
    fn test_project_can_reset_value_to_default() {
        let user: ConfigFile =
            toml::from_str("[batch]\nmin_batch_size = \"1TB\"\n[mpi]\nnp = 16\n").unwrap();
        let project: ConfigFile =
            toml::from_str("[batch]\nmin_batch_size = \"100GB\"\n[mpi]\nnp = 4\n").unwrap();

        let merged = merge_configs(Some(user), Some(project));
        assert_eq!(merged.mpi.np, 4);
        assert_eq!(merged.batch.min_batch_size, "100GB");
    }

    #[test]
    fn test_merge_without_files_is_default() {
        assert_eq!(merge_configs(None, None), Config::default());
    }

    #[test]
    fn test_find_project_config_in_ancestor() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();
        let nested = root.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(
            find_project_config_path(&nested),
            Some(root.path().join(PROJECT_CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_project_config_search_stops_at_git() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();
        let repo = root.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        assert_eq!(find_project_config_path(&repo), None);
    }

    #[test]
    fn test_validate_config() {
        assert!(validate_config(&Config::default()).is_ok());

        let mut bad_size = Config::default();
        bad_size.batch.min_batch_size = "0".into();
        assert!(validate_config(&bad_size)
            .unwrap_err()
            .to_string()
            .contains("greater than zero"));

        let mut bad_np = Config::default();
        bad_np.mpi.np = 0;
        assert!(validate_config(&bad_np).is_err());
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("archivetar").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("../escape").is_err());
    }
}
