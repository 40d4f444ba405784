//! World persistence hook backed by the database

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::Database;
use crate::error::Result;
use crate::worlds::{WorldFlagStore, WorldOwner};

/// Owning extension that flushes world stores to SQLite
pub struct DatabaseWorldOwner {
    id: String,
    db: Arc<Mutex<Database>>,
}

impl DatabaseWorldOwner {
    pub fn new(id: impl Into<String>, db: Arc<Mutex<Database>>) -> Self {
        Self { id: id.into(), db }
    }
}

impl WorldOwner for DatabaseWorldOwner {
    fn id(&self) -> &str {
        &self.id
    }

    fn save_world_settings(&self, world: &str, flags: &WorldFlagStore) -> Result<()> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.world_settings().save(world, flags)?;
        debug!(owner = %self.id, world, count = flags.len(), "World settings flushed");
        Ok(())
    }
}
