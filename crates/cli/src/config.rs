//! CLI configuration
//!
//! Read from `isleguard.toml`. Every field is optional; missing paths
//! default to the platform data directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use isleguard_core::RankTable;
use serde::{Deserialize, Serialize};

/// Owner id recorded for worlds that do not name one
pub const DEFAULT_OWNER: &str = "isleguard";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not determine data directory")]
    NoDataDir,
}

/// A world to register at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub name: String,
    /// Extension id that owns the world's stored settings
    #[serde(default = "default_owner")]
    pub owner: String,
}

impl From<ConfigError> for isleguard_core::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => isleguard_core::Error::Io(e),
            other => isleguard_core::Error::InvalidOperation(other.to_string()),
        }
    }
}

fn default_owner() -> String {
    DEFAULT_OWNER.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// SQLite database file
    pub database: Option<PathBuf>,
    /// Directory scanned for flag manifests
    pub manifests_dir: Option<PathBuf>,
    /// Rank additions and overrides, by name
    pub ranks: BTreeMap<String, i32>,
    /// Flags only reported to operators
    pub hidden_flags: Vec<String>,
    pub worlds: Vec<WorldConfig>,
}

impl CliConfig {
    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("isleguard.toml"))
    }

    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => project_dirs()
                .map(|dirs| dirs.data_dir().join("isleguard.db"))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    pub fn manifests_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.manifests_dir {
            Some(path) => Ok(path.clone()),
            None => project_dirs()
                .map(|dirs| dirs.config_dir().join("flags"))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    /// Standard ranks with this config's overrides applied
    pub fn rank_table(&self) -> RankTable {
        let mut table = RankTable::default();
        for (name, score) in &self.ranks {
            table.set(name, *score);
        }
        table
    }

    pub fn is_hidden(&self, flag_id: &str) -> bool {
        self.hidden_flags.iter().any(|id| id == flag_id)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "isleguard", "isleguard")
}
