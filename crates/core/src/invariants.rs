//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{Flag, Island, OWNER_RANK};
use crate::worlds::WorldFlagStore;

/// Validate that a flag definition is well formed
pub fn assert_flag_invariants(flag: &Flag) {
    debug_assert!(!flag.id().trim().is_empty(), "Flag has empty id");

    // Sub-flags form a two-level tree; a flag never lists itself
    debug_assert!(
        !flag.subflags().iter().any(|s| s.id() == flag.id()),
        "Flag {} lists itself as a sub-flag",
        flag.id()
    );
}

/// Validate that a lazily read world-scoped flag now has a record
pub fn assert_world_flag_present(store: &WorldFlagStore, flag_id: &str) {
    debug_assert!(
        store.contains(flag_id),
        "World store missing {} after materialization",
        flag_id
    );
}

/// Validate that an island's owner is a member with the owner rank
pub fn assert_island_invariants(island: &Island) {
    if let Some(owner_id) = island.owner_id {
        debug_assert!(
            island.members.get(&owner_id) == Some(&OWNER_RANK),
            "Island {} owner {} does not hold the owner rank",
            island.id,
            owner_id
        );
    }

    debug_assert!(
        !island.world.trim().is_empty(),
        "Island {} has empty world",
        island.id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MEMBER_RANK;
    use crate::FlagBuilder;
    use uuid::Uuid;

    #[test]
    fn test_valid_flag() {
        let child = FlagBuilder::new("child", "STONE").build();
        let parent = FlagBuilder::new("parent", "STONE").subflags([child]).build();
        assert_flag_invariants(&parent);
    }

    #[test]
    #[should_panic(expected = "empty id")]
    fn test_empty_flag_id() {
        FlagBuilder::new("  ", "STONE").build();
    }

    #[test]
    #[should_panic(expected = "lists itself")]
    fn test_self_subflag() {
        let a = FlagBuilder::new("loop", "STONE").build();
        FlagBuilder::new("loop", "STONE").subflags([a]).build();
    }

    #[test]
    fn test_valid_island() {
        let island = Island::new("overworld", Uuid::new_v4());
        assert_island_invariants(&island);
    }

    #[test]
    #[should_panic(expected = "owner rank")]
    fn test_demoted_owner() {
        let owner = Uuid::new_v4();
        let mut island = Island::new("overworld", owner);
        island.set_rank(owner, MEMBER_RANK);
        assert_island_invariants(&island);
    }

    #[test]
    #[should_panic(expected = "missing")]
    fn test_missing_world_flag() {
        assert_world_flag_present(&WorldFlagStore::new(), "pvp");
    }
}
