//! Flag resolution against world stores
//!
//! Read path: protection and world-setting flags always have a per-world
//! record. A missing record is filled from the compiled default on first
//! read and saved before the value is returned. Setting flags ignore the
//! world store and answer with the compiled default.
//!
//! Write path: only world-scoped flags are written. The value is copied
//! to the flag's direct world-scoped sub-flags and the world is saved once
//! after all keys are set.

use std::sync::Arc;

use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants;
use crate::models::{Flag, FlagType, Island};
use crate::worlds::{WorldContext, WorldFlagStore, WorldRegistry};

/// Evaluates and writes flag state for registered worlds
#[derive(Debug, Clone)]
pub struct FlagResolver {
    worlds: Arc<WorldRegistry>,
}

impl FlagResolver {
    pub fn new(worlds: Arc<WorldRegistry>) -> Self {
        Self { worlds }
    }

    pub fn worlds(&self) -> &Arc<WorldRegistry> {
        &self.worlds
    }

    /// Check if a flag is set in a world
    ///
    /// Unregistered worlds always answer `false`.
    #[instrument(level = "debug", skip(self, flag), fields(flag_id = %flag.id()))]
    pub fn is_set_for_world(&self, flag: &Flag, world: &str) -> bool {
        let Some(ctx) = self.worlds.context(world) else {
            return false;
        };
        if !flag.flag_type().is_world_scoped() {
            return flag.default_setting();
        }

        let mut store = ctx.lock_store();
        if let Some(value) = store.get(flag.id()) {
            return value;
        }

        let value = flag.default_setting();
        store.insert(flag.id(), value);
        debug!(world, value, "Materialized world flag from default");
        ctx.persist(&store);
        invariants::assert_world_flag_present(&store, flag.id());
        value
    }

    /// Set a world-scoped flag and its world-scoped sub-flags
    ///
    /// Setting flags are ignored. Writing to an unregistered world is an
    /// error and changes nothing.
    #[instrument(level = "debug", skip(self, flag), fields(flag_id = %flag.id()))]
    pub fn set_setting(&self, flag: &Flag, world: &str, value: bool) -> Result<()> {
        if !flag.flag_type().is_world_scoped() {
            debug!("Ignoring world write for setting flag");
            return Ok(());
        }
        let ctx = self.registered(world)?;

        let mut store = ctx.lock_store();
        store.insert(flag.id(), value);
        for subflag in flag
            .subflags()
            .iter()
            .filter(|s| s.flag_type().is_world_scoped())
        {
            store.insert(subflag.id(), value);
            debug!(subflag_id = %subflag.id(), value, "Sub-flag follows parent");
        }
        ctx.persist(&store);
        Ok(())
    }

    /// Replace the flag's compiled default. No world or sub-flag is touched.
    pub fn set_default_setting(&self, flag: &Flag, value: bool) {
        flag.set_default_setting(value);
    }

    /// Write a flag's value for one world directly
    ///
    /// Unlike [`FlagResolver::set_setting`] this applies to every flag type
    /// and does not touch sub-flags.
    #[instrument(level = "debug", skip(self, flag), fields(flag_id = %flag.id()))]
    pub fn set_world_default_setting(&self, flag: &Flag, world: &str, value: bool) -> Result<()> {
        let ctx = self.registered(world)?;
        let mut store = ctx.lock_store();
        store.insert(flag.id(), value);
        ctx.persist(&store);
        Ok(())
    }

    /// Decide whether `user` may do what `flag` guards
    ///
    /// On an island, protection flags gate on the user's island rank and
    /// setting flags on the island's own setting. Everywhere else the world
    /// read path decides.
    pub fn is_allowed(
        &self,
        flag: &Flag,
        world: &str,
        island: Option<&Island>,
        user_id: Uuid,
    ) -> bool {
        match (flag.flag_type(), island) {
            (FlagType::Protection, Some(island)) => island.is_allowed_for(user_id, flag),
            (FlagType::Setting, Some(island)) => island.is_setting_allowed(flag),
            _ => self.is_set_for_world(flag, world),
        }
    }

    /// Current contents of a world's store
    pub fn world_settings(&self, world: &str) -> Option<WorldFlagStore> {
        self.worlds.context(world).map(|ctx| ctx.snapshot())
    }

    fn registered(&self, world: &str) -> Result<Arc<WorldContext>> {
        self.worlds.context(world).ok_or_else(|| {
            error!(
                world,
                "Attempt to set flag for unregistered world. Register worlds before writing flags."
            );
            Error::UnregisteredWorld(world.to_string())
        })
    }
}
