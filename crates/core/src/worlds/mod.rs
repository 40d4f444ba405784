//! Registered worlds and their flag stores
//!
//! Each world owns one [`WorldFlagStore`] behind its own mutex, so reads
//! that lazily fill a missing key are atomic per world while different
//! worlds never contend. The registry map itself sits behind an `RwLock`
//! that is only write-locked to add or remove worlds.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-world mapping from flag id to setting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldFlagStore {
    flags: BTreeMap<String, bool>,
}

impl WorldFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, flag_id: &str) -> Option<bool> {
        self.flags.get(flag_id).copied()
    }

    pub fn contains(&self, flag_id: &str) -> bool {
        self.flags.contains_key(flag_id)
    }

    /// Set a value, returning the previous one
    pub fn insert(&mut self, flag_id: impl Into<String>, value: bool) -> Option<bool> {
        self.flags.insert(flag_id.into(), value)
    }

    pub fn remove(&mut self, flag_id: &str) -> Option<bool> {
        self.flags.remove(flag_id)
    }

    /// Entries sorted by flag id
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<(String, bool)> for WorldFlagStore {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

/// Extension that owns a world and persists its settings
pub trait WorldOwner: Send + Sync {
    /// Extension id
    fn id(&self) -> &str;

    /// Write the world's whole flag map to durable storage
    fn save_world_settings(&self, world: &str, flags: &WorldFlagStore) -> Result<()>;
}

/// A registered world
pub struct WorldContext {
    name: String,
    owner: Option<Arc<dyn WorldOwner>>,
    store: Mutex<WorldFlagStore>,
}

impl fmt::Debug for WorldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldContext")
            .field("name", &self.name)
            .field("owner", &self.owner.as_ref().map(|o| o.id().to_string()))
            .finish_non_exhaustive()
    }
}

impl WorldContext {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&Arc<dyn WorldOwner>> {
        self.owner.as_ref()
    }

    /// Exclusive access to the world's store
    ///
    /// A poisoned lock is recovered: every critical section leaves the map
    /// consistent after each single insert.
    pub fn lock_store(&self) -> MutexGuard<'_, WorldFlagStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current store
    pub fn snapshot(&self) -> WorldFlagStore {
        self.lock_store().clone()
    }

    /// Ask the owning extension to save the store
    ///
    /// Failures are logged, never returned: the in-memory store stays
    /// authoritative and the next successful save catches up.
    pub fn persist(&self, store: &WorldFlagStore) {
        let Some(owner) = &self.owner else {
            return;
        };
        if let Err(e) = owner.save_world_settings(&self.name, store) {
            tracing::warn!(
                world = %self.name,
                owner = %owner.id(),
                error = %e,
                "Failed to save world settings"
            );
        }
    }
}

/// Registry of recognised worlds
#[derive(Debug, Default)]
pub struct WorldRegistry {
    worlds: RwLock<HashMap<String, Arc<WorldContext>>>,
}

impl WorldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a world with its owner and previously stored settings
    ///
    /// Returns false if a world with this name is already registered.
    pub fn register(
        &self,
        name: impl Into<String>,
        owner: Option<Arc<dyn WorldOwner>>,
        initial: WorldFlagStore,
    ) -> bool {
        let name = name.into();
        let mut worlds = self.worlds.write().unwrap_or_else(PoisonError::into_inner);
        if worlds.contains_key(&name) {
            tracing::warn!(world = %name, "World already registered");
            return false;
        }
        tracing::info!(
            world = %name,
            owner = owner.as_ref().map(|o| o.id()).unwrap_or("none"),
            stored_flags = initial.len(),
            "Registered world"
        );
        let context = WorldContext {
            name: name.clone(),
            owner,
            store: Mutex::new(initial),
        };
        worlds.insert(name, Arc::new(context));
        true
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.worlds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Check if a world is registered
    pub fn in_world(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Get a registered world
    pub fn context(&self, name: &str) -> Option<Arc<WorldContext>> {
        self.read().get(name).cloned()
    }

    /// Extension owning a world
    pub fn owning_extension(&self, name: &str) -> Option<Arc<dyn WorldOwner>> {
        self.context(name).and_then(|ctx| ctx.owner.clone())
    }

    /// Registered world names, sorted
    pub fn world_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<WorldContext>>> {
        self.worlds.read().unwrap_or_else(PoisonError::into_inner)
    }
}
