//! Per-world flag value storage

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::instrument;

use crate::error::Result;
use crate::worlds::WorldFlagStore;

pub struct WorldSettingsStore<'a> {
    conn: &'a Connection,
}

impl<'a> WorldSettingsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Load a world's flag map. Unknown worlds load empty.
    #[instrument(skip(self))]
    pub fn load(&self, world: &str) -> Result<WorldFlagStore> {
        let mut stmt = self
            .conn
            .prepare("SELECT flag_id, value FROM world_flags WHERE world = ?1")?;

        let store = stmt
            .query_map(params![world], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
            })?
            .collect::<std::result::Result<WorldFlagStore, _>>()?;

        Ok(store)
    }

    /// Replace a world's flag map in one transaction
    #[instrument(skip(self, flags), fields(count = flags.len()))]
    pub fn save(&self, world: &str, flags: &WorldFlagStore) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM world_flags WHERE world = ?1", params![world])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO world_flags (world, flag_id, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            let now = Utc::now().to_rfc3339();
            for (flag_id, value) in flags.iter() {
                stmt.execute(params![world, flag_id, value, now])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Worlds with stored values, sorted
    #[instrument(skip(self))]
    pub fn list_worlds(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT world FROM world_flags ORDER BY world")?;
        let worlds = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(worlds)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;
    use crate::worlds::WorldFlagStore;

    #[test]
    fn test_load_unknown_world_is_empty() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.world_settings().load("nether").unwrap().is_empty());
    }

    #[test]
    fn test_save_replaces_world() {
        let db = Database::open_in_memory().unwrap();
        let store = db.world_settings();

        let mut flags = WorldFlagStore::new();
        flags.insert("allow-fire", true);
        flags.insert("pvp", false);
        store.save("overworld", &flags).unwrap();

        let mut next = WorldFlagStore::new();
        next.insert("allow-fire", false);
        store.save("overworld", &next).unwrap();

        let loaded = store.load("overworld").unwrap();
        assert_eq!(loaded, next);
        assert!(!loaded.contains("pvp"));
    }

    #[test]
    fn test_worlds_are_isolated() {
        let db = Database::open_in_memory().unwrap();
        let store = db.world_settings();

        let on: WorldFlagStore = [("mob-spawn".to_string(), true)].into_iter().collect();
        let off: WorldFlagStore = [("mob-spawn".to_string(), false)].into_iter().collect();
        store.save("overworld", &on).unwrap();
        store.save("nether", &off).unwrap();
        store.save("nether", &on).unwrap();

        assert_eq!(store.load("overworld").unwrap().get("mob-spawn"), Some(true));
        assert_eq!(store.load("nether").unwrap().get("mob-spawn"), Some(true));
        assert_eq!(store.list_worlds().unwrap(), vec!["nether", "overworld"]);
    }
}
