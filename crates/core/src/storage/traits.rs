//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock).

use uuid::Uuid;

use crate::error::Result;
use crate::models::Island;
use crate::worlds::WorldFlagStore;

/// Per-world flag settings
pub trait WorldSettingsRepository {
    /// Load every stored flag value for a world
    fn load_world_settings(&self, world: &str) -> Result<WorldFlagStore>;

    /// Replace a world's stored flag values with `flags`
    fn save_world_settings(&self, world: &str, flags: &WorldFlagStore) -> Result<()>;

    /// Worlds with at least one stored flag value
    fn list_worlds(&self) -> Result<Vec<String>>;
}

/// Island repository operations
pub trait IslandRepository {
    /// Insert or replace an island
    fn save_island(&self, island: &Island) -> Result<()>;

    fn find_island_by_id(&self, id: Uuid) -> Result<Option<Island>>;

    /// Islands in a world, oldest first
    fn list_islands_for_world(&self, world: &str) -> Result<Vec<Island>>;

    fn delete_island(&self, id: Uuid) -> Result<()>;
}

/// Combined storage interface
pub trait Storage: WorldSettingsRepository + IslandRepository {}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where T: WorldSettingsRepository + IslandRepository {}
