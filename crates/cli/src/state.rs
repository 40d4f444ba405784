//! Application state: database, flag registry and world registry wired together

use std::sync::{Arc, Mutex, PoisonError};

use isleguard_core::{
    Database, DatabaseWorldOwner, Error, Flag, FlagMode, FlagRegistry, FlagResolver, FlagType,
    Island, RankTable, Result, WorldOwner, WorldRegistry,
};
use uuid::Uuid;

use crate::config::CliConfig;

pub struct AppState {
    pub config: CliConfig,
    pub db: Arc<Mutex<Database>>,
    pub ranks: RankTable,
    pub flags: FlagRegistry,
    pub resolver: FlagResolver,
}

impl AppState {
    /// Open the configured database and load manifests and worlds
    pub fn new(config: CliConfig) -> Result<Self> {
        let db_path = config.database_path()?;

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path)?;
        Self::with_database(config, db)
    }

    /// Build state around an already open database
    pub fn with_database(config: CliConfig, db: Database) -> Result<Self> {
        let ranks = config.rank_table();

        let mut flags = FlagRegistry::new();
        if let Ok(dir) = config.manifests_path() {
            let loaded = flags.scan(&dir, &ranks);
            tracing::info!(dir = %dir.display(), loaded, "Loaded flag manifests");
        }
        for (path, err) in flags.load_errors() {
            tracing::warn!(path = %path.display(), "Skipped manifest: {}", err);
        }

        let mut initial = Vec::with_capacity(config.worlds.len());
        for world in &config.worlds {
            initial.push(db.world_settings().load(&world.name)?);
        }

        let db = Arc::new(Mutex::new(db));
        let worlds = Arc::new(WorldRegistry::new());
        for (world, stored) in config.worlds.iter().zip(initial) {
            let owner: Arc<dyn WorldOwner> =
                Arc::new(DatabaseWorldOwner::new(&world.owner, db.clone()));
            worlds.register(&world.name, Some(owner), stored);
        }

        Ok(Self {
            config,
            db,
            ranks,
            flags,
            resolver: FlagResolver::new(worlds),
        })
    }

    pub fn flag(&self, id: &str) -> Result<&Arc<Flag>> {
        self.flags
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("flag '{id}'")))
    }

    /// Fail unless `world` is registered
    pub fn require_world(&self, world: &str) -> Result<()> {
        if self.resolver.worlds().in_world(world) {
            Ok(())
        } else {
            Err(Error::UnregisteredWorld(world.to_string()))
        }
    }

    /// Registered flags matching every given filter, sorted by id
    pub fn list_flags(
        &self,
        flag_type: Option<FlagType>,
        mode: Option<FlagMode>,
        game_mode: Option<&str>,
    ) -> Vec<&Arc<Flag>> {
        let mut flags = match flag_type {
            Some(flag_type) => self.flags.by_type(flag_type),
            None => self.flags.flags().collect(),
        };
        if let Some(mode) = mode {
            let shown = self.flags.for_mode(mode);
            flags.retain(|f| shown.contains(f));
        }
        if let Some(game_mode) = game_mode {
            let applicable = self.flags.for_game_mode(game_mode);
            flags.retain(|f| applicable.contains(f));
        }
        flags
    }

    /// Write a world-scoped flag for a registered world
    ///
    /// Island settings have no world value, so writing one is rejected
    /// instead of silently ignored.
    pub fn write_world_flag(
        &self,
        world: &str,
        flag_id: &str,
        value: bool,
    ) -> Result<&Arc<Flag>> {
        self.require_world(world)?;
        let flag = self.flag(flag_id)?;
        if !flag.flag_type().is_world_scoped() {
            return Err(Error::InvalidOperation(format!(
                "{} is an island setting; use `isleguard island toggle`",
                flag.id()
            )));
        }
        self.resolver.set_setting(flag, world, value)?;
        Ok(flag)
    }

    /// Create and store an island in a registered world
    pub fn create_island(&self, world: &str, owner: Uuid) -> Result<Island> {
        self.require_world(world)?;
        let island = Island::new(world, owner);
        self.save_island(&island)?;
        tracing::info!(island_id = %island.id, world = %island.world, "Created island");
        Ok(island)
    }

    pub fn island(&self, id: Uuid) -> Result<Island> {
        self.lock_db()
            .islands()
            .find_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("island {id}")))
    }

    pub fn save_island(&self, island: &Island) -> Result<()> {
        self.lock_db().islands().save(island)
    }

    fn lock_db(&self) -> std::sync::MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use std::fs;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
[extension]
id = "skyblock"

[[flags]]
id = "allow-fire"
icon = "FLINT_AND_STEEL"
mode = "basic"

[[flags]]
id = "pvp"
icon = "IRON_SWORD"
type = "setting"
"#;

    fn config(dir: &std::path::Path) -> CliConfig {
        fs::write(dir.join("skyblock.toml"), MANIFEST).unwrap();
        CliConfig {
            manifests_dir: Some(dir.to_path_buf()),
            worlds: vec![WorldConfig {
                name: "skyblock_world".into(),
                owner: "skyblock".into(),
            }],
            ..CliConfig::default()
        }
    }

    #[test]
    fn test_writes_survive_restart() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.database = Some(dir.path().join("isleguard.db"));

        {
            let state = AppState::new(cfg.clone()).unwrap();
            let fire = state.flag("allow-fire").unwrap().clone();
            state
                .resolver
                .set_setting(&fire, "skyblock_world", true)
                .unwrap();
        }

        let state = AppState::new(cfg).unwrap();
        let fire = state.flag("allow-fire").unwrap();
        assert!(state.resolver.is_set_for_world(fire, "skyblock_world"));
    }

    #[test]
    fn test_unknown_lookups() {
        let dir = tempdir().unwrap();
        let state =
            AppState::with_database(config(dir.path()), Database::open_in_memory().unwrap())
                .unwrap();

        assert!(matches!(state.flag("nope"), Err(Error::NotFound(_))));
        assert!(matches!(
            state.require_world("nether"),
            Err(Error::UnregisteredWorld(_))
        ));
        assert!(matches!(
            state.island(Uuid::new_v4()),
            Err(Error::NotFound(_))
        ));
    }

    fn in_memory_state(dir: &std::path::Path) -> AppState {
        AppState::with_database(config(dir), Database::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_write_rejects_island_setting() {
        let dir = tempdir().unwrap();
        let state = in_memory_state(dir.path());

        let err = state
            .write_world_flag("skyblock_world", "pvp", true)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(ref msg) if msg.contains("island toggle")));
        assert!(state
            .resolver
            .world_settings("skyblock_world")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_write_requires_registered_world() {
        let dir = tempdir().unwrap();
        let state = in_memory_state(dir.path());

        for flag in ["pvp", "allow-fire"] {
            assert!(matches!(
                state.write_world_flag("nowhere", flag, true),
                Err(Error::UnregisteredWorld(_))
            ));
        }

        let fire = state
            .write_world_flag("skyblock_world", "allow-fire", true)
            .unwrap();
        assert!(state.resolver.is_set_for_world(fire, "skyblock_world"));
    }

    #[test]
    fn test_create_island_requires_registered_world() {
        let dir = tempdir().unwrap();
        let state = in_memory_state(dir.path());
        let owner = Uuid::new_v4();

        assert!(matches!(
            state.create_island("nowhere", owner),
            Err(Error::UnregisteredWorld(_))
        ));

        let island = state.create_island("skyblock_world", owner).unwrap();
        assert_eq!(state.island(island.id).unwrap().owner_id, Some(owner));
    }

    #[test]
    fn test_list_flags_filters() {
        let dir = tempdir().unwrap();
        let state = in_memory_state(dir.path());

        let ids = |flags: Vec<&Arc<Flag>>| {
            flags
                .iter()
                .map(|f| f.id().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(state.list_flags(None, None, None)), vec!["allow-fire", "pvp"]);
        assert_eq!(
            ids(state.list_flags(Some(FlagType::Setting), None, None)),
            vec!["pvp"]
        );
        assert_eq!(
            ids(state.list_flags(None, Some(FlagMode::Basic), None)),
            vec!["allow-fire"]
        );
        assert_eq!(
            ids(state.list_flags(Some(FlagType::Setting), Some(FlagMode::Basic), None)),
            Vec::<String>::new()
        );
        assert_eq!(ids(state.list_flags(None, None, Some("oneblock"))).len(), 2);
    }
}
