//! Flag manifest schema and loader
//!
//! Extensions declare their flags in TOML. Each manifest names the
//! extension and lists flag definitions in dependency order: a flag may
//! only list sub-flags declared before it (in the same manifest or
//! already registered).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::FlagBuilder;
use crate::models::{ClickHandler, Flag, FlagMode, FlagType, RankTable};
use crate::registry::FlagRegistry;

/// Flag manifest loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagManifestToml {
    /// Extension metadata
    pub extension: ExtensionMeta,
    /// Flag definitions in declaration order
    #[serde(default)]
    pub flags: Vec<FlagDef>,
}

/// Extension metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionMeta {
    /// Unique extension id, recorded as the owner of every flag
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Restrict every flag in the manifest to this game mode
    #[serde(default)]
    pub game_mode: Option<String>,
}

/// A rank given by score or by name from the rank table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RankValue {
    Score(i32),
    Named(String),
}

impl RankValue {
    pub fn resolve(&self, ranks: &RankTable) -> Option<i32> {
        match self {
            RankValue::Score(score) => Some(*score),
            RankValue::Named(name) => ranks.score(name),
        }
    }
}

/// One flag definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagDef {
    pub id: String,
    pub icon: String,
    #[serde(rename = "type", default)]
    pub flag_type: FlagType,
    #[serde(default)]
    pub mode: FlagMode,
    /// Protection threshold, defaults to the member rank
    #[serde(default)]
    pub default_rank: Option<RankValue>,
    #[serde(default)]
    pub default_setting: bool,
    /// Seconds between toggles
    #[serde(default)]
    pub cooldown: i32,
    #[serde(default)]
    pub use_panel: bool,
    /// Id of an extension-supplied click handler
    #[serde(default)]
    pub click_handler: Option<String>,
    /// Ids of flags that follow this one on write
    #[serde(default)]
    pub subflags: Vec<String>,
}

/// Error type for manifest loading
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse manifest TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Flag '{flag}' uses unknown rank '{rank}'")]
    UnknownRank { flag: String, rank: String },
    #[error("Flag '{flag}' lists unknown sub-flag '{subflag}'")]
    UnknownSubflag { flag: String, subflag: String },
    #[error("Flag '{flag}' lists '{subflag}' which has sub-flags of its own")]
    NestedSubflag { flag: String, subflag: String },
    #[error("Manifest file not found: {0}")]
    ManifestNotFound(PathBuf),
}

impl FlagManifestToml {
    /// Load a manifest file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::ManifestNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a manifest directly from TOML content
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Declared flag ids in order
    pub fn flag_ids(&self) -> Vec<&str> {
        self.flags.iter().map(|f| f.id.as_str()).collect()
    }

    /// Build every flag in declaration order
    ///
    /// Sub-flag ids resolve against `registry` first, then against flags
    /// built earlier from this manifest. Nothing is registered here.
    pub fn build_flags(
        &self,
        ranks: &RankTable,
        registry: &FlagRegistry,
    ) -> Result<Vec<Arc<Flag>>, ManifestError> {
        let mut built: Vec<Arc<Flag>> = Vec::with_capacity(self.flags.len());

        for def in &self.flags {
            let mut builder = FlagBuilder::new(&def.id, &def.icon)
                .flag_type(def.flag_type)
                .mode(def.mode)
                .default_setting(def.default_setting)
                .cooldown(def.cooldown)
                .use_panel(def.use_panel)
                .owner(&self.extension.id);

            if let Some(game_mode) = &self.extension.game_mode {
                builder = builder.game_mode(game_mode);
            }

            if let Some(rank) = &def.default_rank {
                let score = rank.resolve(ranks).ok_or_else(|| ManifestError::UnknownRank {
                    flag: def.id.clone(),
                    rank: match rank {
                        RankValue::Named(name) => name.clone(),
                        RankValue::Score(score) => score.to_string(),
                    },
                })?;
                builder = builder.default_rank(score);
            }

            if let Some(handler) = &def.click_handler {
                builder = builder.click_handler(ClickHandler::Custom(handler.clone()));
            }

            let mut subflags = Vec::with_capacity(def.subflags.len());
            for sub_id in &def.subflags {
                // A registered flag wins over a same-id declaration here,
                // which registration would reject anyway.
                let subflag = registry
                    .get(sub_id)
                    .or_else(|| built.iter().find(|f| f.id() == sub_id))
                    .cloned()
                    .ok_or_else(|| ManifestError::UnknownSubflag {
                        flag: def.id.clone(),
                        subflag: sub_id.clone(),
                    })?;
                if subflag.has_subflags() {
                    return Err(ManifestError::NestedSubflag {
                        flag: def.id.clone(),
                        subflag: sub_id.clone(),
                    });
                }
                subflags.push(subflag);
            }

            built.push(builder.subflags(subflags).build());
        }

        Ok(built)
    }
}

/// Discover all flag manifests in a directory
///
/// Every `*.toml` file is loaded, sorted by path. Errors are returned per
/// file so one bad manifest does not hide the others.
pub fn discover_manifests(dir: &Path) -> Vec<(PathBuf, Result<FlagManifestToml, ManifestError>)> {
    let mut results = Vec::new();

    if !dir.exists() {
        return results;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return results,
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    for path in paths {
        let manifest = FlagManifestToml::load(&path);
        results.push((path, manifest));
    }

    results
}
