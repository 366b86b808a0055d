use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};

/// File name looked up in the repository root and the user config directory
pub const CONFIG_FILE_NAME: &str = "releaser.toml";

/// Represents the complete configuration for releaser.
///
/// Every key is optional; a missing file or section means defaults.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub release: ReleaseConfig,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_changelog_path() -> PathBuf {
    PathBuf::from("docs/changelog.md")
}

fn default_scripts_manifest() -> PathBuf {
    PathBuf::from(".pre-release-scripts.txt")
}

fn default_fetch_grace_period_secs() -> u64 {
    60
}

/// Which remote branch releases are cut from.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RepositoryConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            remote: default_remote(),
            branch: default_branch(),
        }
    }
}

/// Location of the changelog, relative to the repository root.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChangelogConfig {
    #[serde(default = "default_changelog_path")]
    pub path: PathBuf,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            path: default_changelog_path(),
        }
    }
}

/// Release behavior.
///
/// `extra_paths` are committed together with the changelog, typically files
/// the pre-release scripts rewrite. Paths are literal, never globs.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_scripts_manifest")]
    pub scripts_manifest: PathBuf,

    #[serde(default)]
    pub extra_paths: Vec<PathBuf>,

    #[serde(default = "default_fetch_grace_period_secs")]
    pub fetch_grace_period_secs: u64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            scripts_manifest: default_scripts_manifest(),
            extra_paths: Vec::new(),
            fetch_grace_period_secs: default_fetch_grace_period_secs(),
        }
    }
}

/// Parse configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| ReleaseError::config(format!("Invalid configuration: {}", e)))
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `releaser.toml` in the repository root
/// 3. `releaser.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
/// * `repo_root` - Working tree root of the repository being released
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed, or if the custom
///   path does not exist
pub fn load_config(config_path: Option<&Path>, repo_root: &Path) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => [
            Some(repo_root.join(CONFIG_FILE_NAME)),
            dirs::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)),
        ]
        .into_iter()
        .flatten()
        .find(|candidate| candidate.exists()),
    };

    let Some(path) = path else {
        log::debug!("No configuration file found, using defaults");
        return Ok(Config::default());
    };

    log::debug!("Loading configuration from '{}'", path.display());
    let contents = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::config(format!("Cannot read configuration '{}': {}", path.display(), e))
    })?;

    parse_config(&contents)
}
