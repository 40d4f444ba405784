//! Flag reports - what a menu entry for a flag should show
//!
//! Rendering and translation belong to the caller. This module decides the
//! content: whether the entry is visible, and the state for the flag's type.

use serde::Serialize;

use crate::models::{Flag, FlagType, Island, RankTable};
use crate::permissions::{rank_tiers, RankLine};
use crate::resolver::FlagResolver;

/// State shown for a flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlagStatus {
    /// Entry opens a sub-panel and shows no state of its own
    SubPanel,
    /// World setting, active or disabled for the world
    WorldSetting { active: bool },
    /// Island setting. Without an island only the description is shown.
    Setting {
        allowed: Option<bool>,
        on_cooldown: bool,
    },
    /// Protection flag with each rank's tier against the island threshold
    Protection {
        threshold: Option<i32>,
        ranks: Vec<RankLine>,
    },
}

/// Report for one flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagReport {
    pub flag_id: String,
    pub icon: String,
    pub name_reference: String,
    pub description_reference: String,
    pub hidden: bool,
    pub status: FlagStatus,
}

/// Builds [`FlagReport`]s
pub struct FlagReporter<'a> {
    resolver: &'a FlagResolver,
    ranks: &'a RankTable,
}

impl<'a> FlagReporter<'a> {
    pub fn new(resolver: &'a FlagResolver, ranks: &'a RankTable) -> Self {
        Self { resolver, ranks }
    }

    /// Describe a flag for a viewer
    ///
    /// Hidden flags are only reported to operators. `island` is the island
    /// being viewed, if any; `world` must then be the island's world.
    pub fn describe(
        &self,
        flag: &Flag,
        world: &str,
        island: Option<&Island>,
        viewer_is_op: bool,
        hidden: bool,
    ) -> Option<FlagReport> {
        if hidden && !viewer_is_op {
            return None;
        }

        let status = if flag.has_sub_panel() {
            FlagStatus::SubPanel
        } else {
            match flag.flag_type() {
                FlagType::Protection => {
                    let threshold = island.map(|i| i.flag_rank(flag));
                    FlagStatus::Protection {
                        threshold,
                        ranks: threshold
                            .map(|t| rank_tiers(self.ranks, t))
                            .unwrap_or_default(),
                    }
                }
                FlagType::Setting => FlagStatus::Setting {
                    allowed: island.map(|i| i.is_setting_allowed(flag)),
                    on_cooldown: flag.cooldown() > 0
                        && island.is_some_and(|i| i.is_on_cooldown(flag)),
                },
                FlagType::WorldSetting => FlagStatus::WorldSetting {
                    active: self.resolver.is_set_for_world(flag, world),
                },
            }
        };

        Some(FlagReport {
            flag_id: flag.id().to_string(),
            icon: flag.icon().to_string(),
            name_reference: flag.name_reference(),
            description_reference: flag.description_reference(),
            hidden,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TRUSTED_RANK, VISITOR_RANK};
    use crate::permissions::RankTier;
    use crate::worlds::{WorldFlagStore, WorldRegistry};
    use crate::FlagBuilder;
    use std::sync::Arc;
    use uuid::Uuid;

    const WORLD: &str = "skyblock_world";

    fn resolver() -> FlagResolver {
        let worlds = Arc::new(WorldRegistry::new());
        worlds.register(WORLD, None, WorldFlagStore::new());
        FlagResolver::new(worlds)
    }

    #[test]
    fn test_hidden_only_for_operators() {
        let resolver = resolver();
        let ranks = RankTable::default();
        let reporter = FlagReporter::new(&resolver, &ranks);
        let flag = FlagBuilder::new("secret", "BARRIER").build();

        assert!(reporter.describe(&flag, WORLD, None, false, true).is_none());
        let report = reporter.describe(&flag, WORLD, None, true, true).unwrap();
        assert!(report.hidden);
        assert_eq!(report.name_reference, "protection.flags.secret.name");
    }

    #[test]
    fn test_sub_panel_has_no_state() {
        let resolver = resolver();
        let ranks = RankTable::default();
        let reporter = FlagReporter::new(&resolver, &ranks);
        let flag = FlagBuilder::new("geo-limit", "CHEST_MINECART")
            .flag_type(FlagType::WorldSetting)
            .use_panel(true)
            .build();

        let report = reporter.describe(&flag, WORLD, None, false, false).unwrap();
        assert_eq!(report.status, FlagStatus::SubPanel);
        // A sub-panel entry does not read the world
        assert!(resolver.world_settings(WORLD).unwrap().is_empty());
    }

    #[test]
    fn test_world_setting_reads_world() {
        let resolver = resolver();
        let ranks = RankTable::default();
        let reporter = FlagReporter::new(&resolver, &ranks);
        let flag = FlagBuilder::new("mob-spawn", "ZOMBIE_HEAD")
            .flag_type(FlagType::WorldSetting)
            .default_setting(true)
            .build();

        let report = reporter.describe(&flag, WORLD, None, false, false).unwrap();
        assert_eq!(report.status, FlagStatus::WorldSetting { active: true });
    }

    #[test]
    fn test_setting_with_island_and_cooldown() {
        let resolver = resolver();
        let ranks = RankTable::default();
        let reporter = FlagReporter::new(&resolver, &ranks);
        let flag = FlagBuilder::new("pvp", "IRON_SWORD")
            .flag_type(FlagType::Setting)
            .cooldown(60)
            .build();
        let mut island = Island::new(WORLD, Uuid::new_v4());
        island.set_setting(&flag, true);
        island.set_cooldown(&flag);

        let report = reporter
            .describe(&flag, WORLD, Some(&island), false, false)
            .unwrap();
        assert_eq!(
            report.status,
            FlagStatus::Setting {
                allowed: Some(true),
                on_cooldown: true
            }
        );

        let without = reporter.describe(&flag, WORLD, None, false, false).unwrap();
        assert_eq!(
            without.status,
            FlagStatus::Setting {
                allowed: None,
                on_cooldown: false
            }
        );
    }

    #[test]
    fn test_protection_rank_tiers() {
        let resolver = resolver();
        let ranks = RankTable::default();
        let reporter = FlagReporter::new(&resolver, &ranks);
        let flag = FlagBuilder::new("doors", "OAK_DOOR").build();
        let mut island = Island::new(WORLD, Uuid::new_v4());
        island.set_flag_rank(&flag, TRUSTED_RANK);

        let report = reporter
            .describe(&flag, WORLD, Some(&island), false, false)
            .unwrap();
        let FlagStatus::Protection { threshold, ranks } = report.status else {
            panic!("expected protection status");
        };
        assert_eq!(threshold, Some(TRUSTED_RANK));
        let visitor = ranks.iter().find(|l| l.score == VISITOR_RANK).unwrap();
        assert_eq!(visitor.tier, RankTier::Blocked);
        let trusted = ranks.iter().find(|l| l.score == TRUSTED_RANK).unwrap();
        assert_eq!(trusted.tier, RankTier::Minimal);
    }
}
