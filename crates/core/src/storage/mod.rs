//! SQLite storage layer for world flag settings and islands

mod islands;
mod migrations;
mod owner;
mod parse;
mod traits;
mod world_settings;

use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Island;
use crate::worlds::WorldFlagStore;

pub use islands::IslandStore;
pub use owner::DatabaseWorldOwner;
pub use traits::{IslandRepository, Storage, WorldSettingsRepository};
pub use world_settings::WorldSettingsStore;

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    pub fn world_settings(&self) -> WorldSettingsStore<'_> {
        WorldSettingsStore::new(&self.conn)
    }

    pub fn islands(&self) -> IslandStore<'_> {
        IslandStore::new(&self.conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl WorldSettingsRepository for Database {
    fn load_world_settings(&self, world: &str) -> Result<WorldFlagStore> {
        self.world_settings().load(world)
    }

    fn save_world_settings(&self, world: &str, flags: &WorldFlagStore) -> Result<()> {
        self.world_settings().save(world, flags)
    }

    fn list_worlds(&self) -> Result<Vec<String>> {
        self.world_settings().list_worlds()
    }
}

impl IslandRepository for Database {
    fn save_island(&self, island: &Island) -> Result<()> {
        self.islands().save(island)
    }

    fn find_island_by_id(&self, id: Uuid) -> Result<Option<Island>> {
        self.islands().find_by_id(id)
    }

    fn list_islands_for_world(&self, world: &str) -> Result<Vec<Island>> {
        self.islands().list_for_world(world)
    }

    fn delete_island(&self, id: Uuid) -> Result<()> {
        self.islands().delete(id)
    }
}
