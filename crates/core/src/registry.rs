//! Flag registry - owns every registered flag definition
//!
//! Flags are looked up by id. The registry also indexes which extension
//! registered each flag and which game modes a flag applies to, so flags
//! never hold references back to extensions or game modes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::manifest::{discover_manifests, FlagManifestToml, ManifestError};
use crate::models::{Flag, FlagMode, FlagType, RankTable};

/// Flag registry - central store of flag definitions
#[derive(Debug, Default)]
pub struct FlagRegistry {
    /// Registered flags by id
    flags: BTreeMap<String, Arc<Flag>>,
    /// Flag ids by owning extension
    by_extension: HashMap<String, BTreeSet<String>>,
    /// Game modes by flag id. Empty or missing means every game mode.
    game_modes: HashMap<String, BTreeSet<String>>,
    /// Load errors for diagnostics
    load_errors: Vec<(PathBuf, ManifestError)>,
}

impl FlagRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag
    ///
    /// Returns false, leaving the registry unchanged, if a flag with the
    /// same id is already registered.
    pub fn register(&mut self, flag: Arc<Flag>) -> bool {
        let id = flag.id().to_string();
        if self.flags.contains_key(&id) {
            tracing::warn!(flag_id = %id, "Flag id already registered, ignoring");
            return false;
        }

        if let Some(owner) = flag.owner() {
            self.by_extension
                .entry(owner.to_string())
                .or_default()
                .insert(id.clone());
        }
        if let Some(game_mode) = flag.game_mode() {
            self.game_modes
                .entry(id.clone())
                .or_default()
                .insert(game_mode.to_string());
        }

        tracing::info!(flag_id = %id, flag_type = %flag.flag_type(), "Registered flag");
        self.flags.insert(id, flag);
        true
    }

    /// Build and register every flag in a manifest
    ///
    /// Returns the flags that were newly registered. Flags whose id is
    /// already taken are skipped.
    pub fn load_manifest(
        &mut self,
        manifest: &FlagManifestToml,
        ranks: &RankTable,
    ) -> Result<Vec<Arc<Flag>>, ManifestError> {
        let built = manifest.build_flags(ranks, self)?;
        Ok(built
            .into_iter()
            .filter(|flag| self.register(flag.clone()))
            .collect())
    }

    /// Load every manifest in a directory
    ///
    /// Failures are recorded in [`FlagRegistry::load_errors`]. Returns the
    /// number of flags registered.
    pub fn scan(&mut self, dir: &Path, ranks: &RankTable) -> usize {
        let mut registered = 0;

        for (path, result) in discover_manifests(dir) {
            let loaded = result.and_then(|manifest| self.load_manifest(&manifest, ranks));
            match loaded {
                Ok(flags) => {
                    tracing::info!(path = %path.display(), flags = flags.len(), "Loaded flag manifest");
                    registered += flags.len();
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to load flag manifest");
                    self.load_errors.push((path, e));
                }
            }
        }

        registered
    }

    /// Get a flag by id
    pub fn get(&self, id: &str) -> Option<&Arc<Flag>> {
        self.flags.get(id)
    }

    /// Check if a flag is registered
    pub fn contains(&self, id: &str) -> bool {
        self.flags.contains_key(id)
    }

    /// All flags, sorted by id
    pub fn flags(&self) -> impl Iterator<Item = &Arc<Flag>> {
        self.flags.values()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flags of one type
    pub fn by_type(&self, flag_type: FlagType) -> Vec<&Arc<Flag>> {
        self.flags
            .values()
            .filter(|f| f.flag_type() == flag_type)
            .collect()
    }

    /// Flags shown at a menu tier: everything not ranked above it
    pub fn for_mode(&self, mode: FlagMode) -> Vec<&Arc<Flag>> {
        self.flags
            .values()
            .filter(|f| !f.mode().is_greater_than(mode))
            .collect()
    }

    /// Associate a flag with a game mode
    pub fn add_game_mode(&mut self, flag_id: &str, game_mode: &str) -> bool {
        if !self.flags.contains_key(flag_id) {
            return false;
        }
        self.game_modes
            .entry(flag_id.to_string())
            .or_default()
            .insert(game_mode.to_string())
    }

    /// Drop a game mode association
    pub fn remove_game_mode(&mut self, flag_id: &str, game_mode: &str) -> bool {
        self.game_modes
            .get_mut(flag_id)
            .is_some_and(|modes| modes.remove(game_mode))
    }

    /// Game modes a flag is restricted to. Empty means all.
    pub fn game_modes(&self, flag_id: &str) -> BTreeSet<&str> {
        self.game_modes
            .get(flag_id)
            .map(|modes| modes.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Check if a registered flag applies to a game mode
    pub fn applies_to(&self, flag_id: &str, game_mode: &str) -> bool {
        if !self.flags.contains_key(flag_id) {
            return false;
        }
        match self.game_modes.get(flag_id) {
            Some(modes) if !modes.is_empty() => modes.contains(game_mode),
            _ => true,
        }
    }

    /// Flags that apply to a game mode
    pub fn for_game_mode(&self, game_mode: &str) -> Vec<&Arc<Flag>> {
        self.flags
            .values()
            .filter(|f| self.applies_to(f.id(), game_mode))
            .collect()
    }

    /// Flags registered by an extension
    pub fn flags_of_extension(&self, extension_id: &str) -> Vec<&Arc<Flag>> {
        self.by_extension
            .get(extension_id)
            .map(|ids| ids.iter().filter_map(|id| self.flags.get(id)).collect())
            .unwrap_or_default()
    }

    /// Remove every flag an extension registered, e.g. before a reload
    pub fn unregister_extension(&mut self, extension_id: &str) -> Vec<Arc<Flag>> {
        let Some(ids) = self.by_extension.remove(extension_id) else {
            return Vec::new();
        };

        let removed: Vec<Arc<Flag>> = ids
            .iter()
            .filter_map(|id| {
                self.game_modes.remove(id);
                self.flags.remove(id)
            })
            .collect();

        tracing::info!(extension = %extension_id, flags = removed.len(), "Unregistered extension flags");
        removed
    }

    /// Get load errors for diagnostics
    pub fn load_errors(&self) -> &[(PathBuf, ManifestError)] {
        &self.load_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlagBuilder;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_manifest(dir: &Path, extension: &str, flag_ids: &[&str]) {
        let flags = flag_ids
            .iter()
            .map(|id| format!("[[flags]]\nid = \"{}\"\nicon = \"STONE\"\n", id))
            .collect::<Vec<_>>()
            .join("\n");

        let manifest = format!(
            r#"
[extension]
id = "{}"

{}
"#,
            extension, flags
        );

        fs::write(dir.join(format!("{}.toml", extension)), manifest).unwrap();
    }

    #[test]
    fn test_register_rejects_duplicate_id() {
        let mut registry = FlagRegistry::new();
        let first = FlagBuilder::new("pvp", "IRON_SWORD")
            .flag_type(FlagType::Setting)
            .build();
        let second = FlagBuilder::new("pvp", "DIAMOND_SWORD")
            .flag_type(FlagType::WorldSetting)
            .build();

        assert!(registry.register(first));
        assert!(!registry.register(second));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("pvp").unwrap().icon(), "IRON_SWORD");
    }

    #[test]
    fn test_manifest_subflag_uses_registered_flag() {
        use crate::resolver::FlagResolver;
        use crate::worlds::{WorldFlagStore, WorldRegistry};

        let mut registry = FlagRegistry::new();
        let pvp = FlagBuilder::new("pvp", "IRON_SWORD")
            .flag_type(FlagType::Setting)
            .build();
        registry.register(pvp.clone());

        let manifest = FlagManifestToml::from_toml(
            r#"
[extension]
id = "combat-pack"

[[flags]]
id = "pvp"
icon = "IRON_SWORD"

[[flags]]
id = "combat"
icon = "SHIELD"
subflags = ["pvp"]
"#,
        )
        .unwrap();
        let loaded = registry
            .load_manifest(&manifest, &RankTable::default())
            .unwrap();
        assert_eq!(loaded.len(), 1);

        let combat = registry.get("combat").unwrap().clone();
        assert!(Arc::ptr_eq(&combat.subflags()[0], &pvp));
        assert_eq!(combat.subflags()[0].flag_type(), FlagType::Setting);

        let worlds = Arc::new(WorldRegistry::new());
        worlds.register("w", None, WorldFlagStore::new());
        let resolver = FlagResolver::new(worlds);
        resolver.set_setting(&combat, "w", true).unwrap();

        let store = resolver.world_settings("w").unwrap();
        assert_eq!(store.get("combat"), Some(true));
        assert!(!store.contains("pvp"));
    }

    #[test]
    fn test_by_type_and_mode() {
        let mut registry = FlagRegistry::new();
        registry.register(
            FlagBuilder::new("doors", "OAK_DOOR")
                .mode(FlagMode::Basic)
                .build(),
        );
        registry.register(
            FlagBuilder::new("pvp", "IRON_SWORD")
                .flag_type(FlagType::Setting)
                .mode(FlagMode::Advanced)
                .build(),
        );
        registry.register(FlagBuilder::new("tnt", "TNT").build());
        registry.register(
            FlagBuilder::new("lock", "LOCK")
                .mode(FlagMode::TopRow)
                .build(),
        );

        assert_eq!(registry.by_type(FlagType::Protection).len(), 3);
        assert_eq!(registry.by_type(FlagType::Setting).len(), 1);

        let basic: Vec<&str> = registry
            .for_mode(FlagMode::Basic)
            .iter()
            .map(|f| f.id())
            .collect();
        assert_eq!(basic, vec!["doors", "lock"]);
        assert_eq!(registry.for_mode(FlagMode::Advanced).len(), 3);
        assert_eq!(registry.for_mode(FlagMode::Expert).len(), 4);
    }

    #[test]
    fn test_game_mode_associations() {
        let mut registry = FlagRegistry::new();
        registry.register(FlagBuilder::new("global", "STONE").build());
        registry.register(
            FlagBuilder::new("sky-only", "FEATHER")
                .game_mode("skyblock")
                .build(),
        );

        assert!(registry.applies_to("global", "skyblock"));
        assert!(registry.applies_to("global", "oneblock"));
        assert!(registry.applies_to("sky-only", "skyblock"));
        assert!(!registry.applies_to("sky-only", "oneblock"));
        assert!(!registry.applies_to("missing", "skyblock"));

        assert!(registry.add_game_mode("sky-only", "oneblock"));
        assert!(registry.applies_to("sky-only", "oneblock"));
        assert_eq!(
            registry.game_modes("sky-only"),
            BTreeSet::from(["oneblock", "skyblock"])
        );

        assert!(registry.remove_game_mode("sky-only", "skyblock"));
        assert!(registry.remove_game_mode("sky-only", "oneblock"));
        // No associations left: applies everywhere again
        assert!(registry.applies_to("sky-only", "anything"));
        assert!(!registry.add_game_mode("missing", "skyblock"));

        assert_eq!(registry.for_game_mode("acidisland").len(), 2);
    }

    #[test]
    fn test_unregister_extension() {
        let mut registry = FlagRegistry::new();
        registry.register(FlagBuilder::new("a", "STONE").owner("ext-a").build());
        registry.register(FlagBuilder::new("b", "STONE").owner("ext-a").build());
        registry.register(FlagBuilder::new("c", "STONE").owner("ext-b").build());

        assert_eq!(registry.flags_of_extension("ext-a").len(), 2);
        let removed = registry.unregister_extension("ext-a");
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.flags_of_extension("ext-a").is_empty());
        assert!(registry.unregister_extension("ext-a").is_empty());
    }

    #[test]
    fn test_load_manifest_resolves_registered_subflags() {
        let mut registry = FlagRegistry::new();
        registry.register(FlagBuilder::new("ender-chest", "ENDER_CHEST").build());

        let manifest = FlagManifestToml::from_toml(
            r#"
[extension]
id = "containers-addon"

[[flags]]
id = "containers"
icon = "CHEST"
subflags = ["ender-chest"]
"#,
        )
        .unwrap();

        let added = registry
            .load_manifest(&manifest, &RankTable::default())
            .unwrap();
        assert_eq!(added.len(), 1);
        let containers = registry.get("containers").unwrap();
        assert!(Arc::ptr_eq(
            &containers.subflags()[0],
            registry.get("ender-chest").unwrap()
        ));
    }

    #[test]
    fn test_scan_directory() {
        let temp = TempDir::new().unwrap();
        create_test_manifest(temp.path(), "ext-a", &["doors", "chests"]);
        create_test_manifest(temp.path(), "ext-b", &["doors", "tnt"]);
        fs::write(temp.path().join("broken.toml"), "[extension]").unwrap();

        let mut registry = FlagRegistry::new();
        let count = registry.scan(temp.path(), &RankTable::default());

        // "doors" from ext-b loses to ext-a (files load in path order)
        assert_eq!(count, 3);
        assert_eq!(registry.get("doors").unwrap().owner(), Some("ext-a"));
        assert_eq!(registry.load_errors().len(), 1);
        assert!(registry.load_errors()[0].0.ends_with("broken.toml"));
    }
}
