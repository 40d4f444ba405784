//! Island storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_json, parse_uuid, parse_uuid_opt, OptionalExt};
use crate::error::Result;
use crate::invariants::assert_island_invariants;
use crate::models::Island;

const ISLAND_COLUMNS: &str = "id, world, owner_id, created_at, members, flags, cooldowns";

pub struct IslandStore<'a> {
    conn: &'a Connection,
}

impl<'a> IslandStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or replace an island
    #[instrument(skip(self, island), fields(island_id = %island.id, world = %island.world))]
    pub fn save(&self, island: &Island) -> Result<()> {
        assert_island_invariants(island);

        self.conn.execute(
            "INSERT INTO islands (id, world, owner_id, created_at, members, flags, cooldowns)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                world = excluded.world,
                owner_id = excluded.owner_id,
                members = excluded.members,
                flags = excluded.flags,
                cooldowns = excluded.cooldowns",
            params![
                island.id.to_string(),
                island.world,
                island.owner_id.map(|id| id.to_string()),
                island.created_at.to_rfc3339(),
                serde_json::to_string(&island.members)?,
                serde_json::to_string(&island.flags)?,
                serde_json::to_string(&island.cooldowns)?,
            ],
        )?;
        Ok(())
    }

    /// Find island by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Island>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ISLAND_COLUMNS} FROM islands WHERE id = ?1"))?;

        let island = stmt
            .query_row(params![id.to_string()], island_from_row)
            .optional()?;

        Ok(island)
    }

    /// List islands in a world, oldest first
    #[instrument(skip(self))]
    pub fn list_for_world(&self, world: &str) -> Result<Vec<Island>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ISLAND_COLUMNS} FROM islands WHERE world = ?1 ORDER BY created_at"
        ))?;

        let islands = stmt
            .query_map(params![world], island_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(islands)
    }

    /// Delete island
    #[instrument(skip(self))]
    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.conn
            .execute("DELETE FROM islands WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }
}

fn island_from_row(row: &Row<'_>) -> rusqlite::Result<Island> {
    Ok(Island {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        world: row.get(1)?,
        owner_id: parse_uuid_opt(row.get::<_, Option<String>>(2)?)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?)?,
        members: parse_json(&row.get::<_, String>(4)?)?,
        flags: parse_json(&row.get::<_, String>(5)?)?,
        cooldowns: parse_json(&row.get::<_, String>(6)?)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::models::{Island, TRUSTED_RANK};
    use crate::storage::Database;
    use crate::FlagBuilder;
    use uuid::Uuid;

    #[test]
    fn test_save_and_find() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let doors = FlagBuilder::new("doors", "OAK_DOOR").build();

        let mut island = Island::new("overworld", owner);
        island.set_rank(guest, TRUSTED_RANK);
        island.set_flag_rank(&doors, TRUSTED_RANK);
        island.set_cooldown(&doors);
        db.islands().save(&island).unwrap();

        let loaded = db.islands().find_by_id(island.id).unwrap().unwrap();
        assert_eq!(loaded.owner_id, Some(owner));
        assert_eq!(loaded.rank_of(guest), TRUSTED_RANK);
        assert_eq!(loaded.flag_rank(&doors), TRUSTED_RANK);
        assert_eq!(loaded.cooldowns, island.cooldowns);
    }

    #[test]
    fn test_save_is_upsert() {
        let db = Database::open_in_memory().unwrap();
        let mut island = Island::new("overworld", Uuid::new_v4());
        db.islands().save(&island).unwrap();

        let pvp = FlagBuilder::new("pvp", "IRON_SWORD")
            .flag_type(crate::models::FlagType::Setting)
            .build();
        island.set_setting(&pvp, true);
        db.islands().save(&island).unwrap();

        let islands = db.islands().list_for_world("overworld").unwrap();
        assert_eq!(islands.len(), 1);
        assert!(islands[0].is_setting_allowed(&pvp));
    }

    #[test]
    fn test_list_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let a = Island::new("overworld", Uuid::new_v4());
        let b = Island::new("nether", Uuid::new_v4());
        db.islands().save(&a).unwrap();
        db.islands().save(&b).unwrap();

        assert_eq!(db.islands().list_for_world("nether").unwrap().len(), 1);

        db.islands().delete(a.id).unwrap();
        assert!(db.islands().find_by_id(a.id).unwrap().is_none());
        assert!(db.islands().list_for_world("overworld").unwrap().is_empty());
    }
}
