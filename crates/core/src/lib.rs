//! Isleguard Core Library
//!
//! Flag definitions, per-world flag resolution, island ranks and SQLite
//! storage for island protection.

pub mod builder;
pub mod error;
pub mod invariants;
pub mod manifest;
pub mod models;
pub mod permissions;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod storage;
pub mod worlds;

pub use builder::FlagBuilder;
pub use error::{Error, Result};
pub use manifest::{discover_manifests, FlagManifestToml, ManifestError};
pub use models::*;
pub use permissions::{is_greater_rank, is_permitted, RankLine, RankTier};
pub use registry::FlagRegistry;
pub use report::{FlagReport, FlagReporter, FlagStatus};
pub use resolver::FlagResolver;
pub use storage::{
    Database, DatabaseWorldOwner, IslandRepository, Storage, WorldSettingsRepository,
};
pub use worlds::{WorldContext, WorldFlagStore, WorldOwner, WorldRegistry};
